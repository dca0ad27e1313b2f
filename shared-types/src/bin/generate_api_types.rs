use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Contact types
    types.push(clean_type(ChannelType::export_to_string()?));
    types.push(clean_type(Channel::export_to_string()?));
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(ContactListParams::export_to_string()?));
    types.push(clean_type(ContactsResponse::export_to_string()?));
    types.push(clean_type(ContactStats::export_to_string()?));
    types.push(clean_type(CreateChannelRequest::export_to_string()?));
    types.push(clean_type(UpdateChannelRequest::export_to_string()?));
    types.push(clean_type(CreateContactRequest::export_to_string()?));
    types.push(clean_type(UpdateContactRequest::export_to_string()?));
    types.push(clean_type(BulkCreateContactsRequest::export_to_string()?));
    types.push(clean_type(BulkCreateContactsResponse::export_to_string()?));
    types.push(clean_type(CheckExistsParams::export_to_string()?));
    types.push(clean_type(CheckExistsResponse::export_to_string()?));

    // Import types
    types.push(clean_type(ImportStatus::export_to_string()?));
    types.push(clean_type(ImportSession::export_to_string()?));
    types.push(clean_type(ImportSessionsResponse::export_to_string()?));
    types.push(clean_type(StagingStatus::export_to_string()?));
    types.push(clean_type(StagingRecord::export_to_string()?));
    types.push(clean_type(StagingRecordParams::export_to_string()?));
    types.push(clean_type(StagingRecordsResponse::export_to_string()?));

    // Transaction types
    types.push(clean_type(TransactionType::export_to_string()?));
    types.push(clean_type(Transaction::export_to_string()?));
    types.push(clean_type(TransactionFilters::export_to_string()?));
    types.push(clean_type(TransactionsResponse::export_to_string()?));
    types.push(clean_type(TransactionSummary::export_to_string()?));
    types.push(clean_type(CreateTransactionRequest::export_to_string()?));
    types.push(clean_type(UpdateTransactionRequest::export_to_string()?));

    // Log types
    types.push(clean_type(LogLevel::export_to_string()?));
    types.push(clean_type(LogEntry::export_to_string()?));
    types.push(clean_type(LogFilters::export_to_string()?));
    types.push(clean_type(LogPage::export_to_string()?));
    types.push(clean_type(LevelCounts::export_to_string()?));
    types.push(clean_type(SourceCount::export_to_string()?));
    types.push(clean_type(LogStats::export_to_string()?));
    types.push(clean_type(LogCleanupResponse::export_to_string()?));

    // JTBD types
    types.push(clean_type(Priority::export_to_string()?));
    types.push(clean_type(ActionType::export_to_string()?));
    types.push(clean_type(GoalType::export_to_string()?));
    types.push(clean_type(PrimaryGoal::export_to_string()?));
    types.push(clean_type(JtbdAction::export_to_string()?));
    types.push(clean_type(JtbdRecord::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
