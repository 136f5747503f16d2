//! Content-addressed cart line ids

use sha2::{Digest, Sha256};

/// Generate a content-addressed line id
///
/// The id is a hash of the identity-defining properties of a line:
/// - item_id: 菜品唯一标识
/// - add-on ids: 加料选择 (sorted, de-duplicated)
///
/// Two additions with the same item and add-on set always produce the same
/// id and are merged (quantities added together). Add-on selection order does
/// not matter.
pub fn generate_line_id<S: AsRef<str>>(item_id: &str, addon_ids: &[S]) -> String {
    let mut ids: Vec<&str> = addon_ids.iter().map(|s| s.as_ref()).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut hasher = Sha256::new();

    // Length prefixes keep ("ab", ["c"]) and ("a", ["bc"]) apart
    hasher.update((item_id.len() as u64).to_le_bytes());
    hasher.update(item_id.as_bytes());
    for id in ids {
        hasher.update((id.len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
    }

    let result = hasher.finalize();
    hex::encode(&result[..16]) // Use first 16 bytes for shorter ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(
            generate_line_id("rice", &["egg", "chili"]),
            generate_line_id("rice", &["egg", "chili"])
        );
        assert_eq!(generate_line_id("rice", &["egg"]).len(), 32);
    }

    #[test]
    fn test_addon_order_and_duplicates_ignored() {
        assert_eq!(
            generate_line_id("rice", &["egg", "chili"]),
            generate_line_id("rice", &["chili", "egg", "egg"])
        );
    }

    #[test]
    fn test_distinct_combinations() {
        let plain: &[&str] = &[];
        assert_ne!(generate_line_id("rice", &["egg"]), generate_line_id("rice", &["chili"]));
        assert_ne!(generate_line_id("rice", &["egg"]), generate_line_id("rice", plain));
        assert_ne!(generate_line_id("ab", &["c"]), generate_line_id("a", &["bc"]));
    }
}
