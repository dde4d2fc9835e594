//! Storage statistics and maintenance commands.

use assetdesk_core::error::AppError;
use assetdesk_service::FileManager;

use crate::output::{self, OutputFormat};

/// Print storage totals
pub async fn execute(manager: &FileManager, format: OutputFormat) -> Result<(), AppError> {
    let stats = manager.get_storage_stats().await?;

    match format {
        OutputFormat::Json => output::print_json(&stats),
        OutputFormat::Table => {
            println!("Storage Statistics");
            println!("{}", "─".repeat(40));
            output::print_kv("Directories", &stats.total_directories.to_string());
            output::print_kv("Files", &stats.total_files.to_string());
            output::print_kv("Total Size", &output::human_size(stats.total_size));
            output::print_kv("Largest File", &output::human_size(stats.largest_file_size));
            output::print_kv(
                "Most Recent Upload",
                &stats
                    .most_recent_upload
                    .map_or_else(|| "never".to_string(), super::short_time),
            );
        }
    }

    Ok(())
}

/// Remove interrupted writes and unreferenced content
pub async fn sweep(manager: &FileManager, format: OutputFormat) -> Result<(), AppError> {
    let report = manager.sweep().await?;
    output::print_done(
        &format!(
            "Sweep complete: {} partial write(s), {} orphaned blob(s) removed",
            report.temp_files, report.orphaned_blobs
        ),
        &report,
        format,
    );
    Ok(())
}
