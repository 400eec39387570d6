use std::path::Path;

use crate::types::SourcePlaylist;

/// Column holding the display name in the responses export.
const NAME_COLUMN: usize = 1;
/// Column holding the playlist URL.
const URL_COLUMN: usize = 2;

pub async fn load_sources(path: &Path) -> Result<Vec<SourcePlaylist>, String> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(parse_sources(&content))
}

/// Parses the comma separated export. The first record is a header and is
/// skipped, as are rows without a URL column.
pub fn parse_sources(content: &str) -> Vec<SourcePlaylist> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cells: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
            let url = cells.get(URL_COLUMN)?.trim();
            if url.is_empty() {
                return None;
            }
            let name = cells.get(NAME_COLUMN).map(|n| n.trim()).unwrap_or_default();
            Some(SourcePlaylist::new(name, url))
        })
        .collect()
}
