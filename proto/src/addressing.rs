/// Port of a datanode under the fixed offset scheme: node `A` listens on
/// `base_port`, `B` on `base_port + 1`, and so on. Only single-letter ids
/// have a derived port.
pub fn datanode_port(base_port: u16, datanode_id: &str) -> Option<u16> {
    let mut chars = datanode_id.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !letter.is_ascii_uppercase() {
        return None;
    }
    base_port.checked_add(letter as u16 - 'A' as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_consecutive_ports() {
        assert_eq!(datanode_port(5001, "A"), Some(5001));
        assert_eq!(datanode_port(5001, "b"), Some(5002));
        assert_eq!(datanode_port(5001, "Z"), Some(5026));
    }

    #[test]
    fn other_ids_have_no_derived_port() {
        assert_eq!(datanode_port(5001, ""), None);
        assert_eq!(datanode_port(5001, "AB"), None);
        assert_eq!(datanode_port(5001, "7"), None);
        assert_eq!(datanode_port(u16::MAX, "C"), None);
    }
}
