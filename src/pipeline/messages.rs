//! User-facing status strings

use std::time::Duration;

pub(crate) const WORKSPACE_FAILED: &str =
    "Could not prepare a working directory for this pack. Please try again later.";

pub(crate) const DOWNLOAD_FAILED: &str = "Failed to download sticker pack. It might be private or non-existent. \
     If it's private, make sure TELETHON_API_ID and TELETHON_API_HASH are set in the bot env \
     and that your sticker-convert build supports Telethon downloads.";

pub(crate) const NO_STICKERS: &str = "No sticker files found after download. Aborting.";

pub(crate) const NO_ARTIFACTS: &str =
    "No .wastickers files were produced. Conversion likely failed.";

pub(crate) const ALL_DONE: &str = "All done - download the .wastickers on your phone and open them \
     in your app to import to WhatsApp.";

pub(crate) fn download_timed_out(after: Duration) -> String {
    format!(
        "Downloading the sticker pack timed out after {}s. Please try again later.",
        after.as_secs()
    )
}

pub(crate) fn downloaded(total: usize, max_per_pack: usize) -> String {
    format!(
        "Downloaded {total} stickers - splitting into chunks of ≤{max_per_pack} and converting..."
    )
}

pub(crate) fn chunk_failed(index: usize) -> String {
    format!("Conversion failed for chunk {index}. Continuing with other chunks.")
}

pub(crate) fn chunk_timed_out(index: usize) -> String {
    format!("Conversion timed out for chunk {index}. Continuing with other chunks.")
}

pub(crate) fn send_failed(name: &str) -> String {
    format!("Failed to send file {name}")
}

pub(crate) fn unexpected(detail: &str) -> String {
    format!("An unexpected error occurred: {detail}")
}
