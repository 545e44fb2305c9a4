use uuid::Uuid;

/// Number of hex characters kept from the random part of an id
const SUFFIX_LEN: usize = 10;

/// The kind of entity an id is minted for; decides the prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    List,
    Task,
    Subtask,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::List => "l",
            IdKind::Task => "t",
            IdKind::Subtask => "st",
        }
    }
}

/// Mint an id like `t_3f9a0c21be`. Random, so no shared counter is needed.
pub fn new_id(kind: IdKind) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}", kind.prefix(), &random[..SUFFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_carry_their_kind_prefix() {
        assert!(new_id(IdKind::List).starts_with("l_"));
        assert!(new_id(IdKind::Task).starts_with("t_"));
        assert!(new_id(IdKind::Subtask).starts_with("st_"));
    }

    #[test]
    fn suffix_is_fixed_length_hex() {
        let id = new_id(IdKind::Task);
        let suffix = id.strip_prefix("t_").unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_do_not_repeat_within_a_session() {
        let ids: HashSet<String> = (0..10_000).map(|_| new_id(IdKind::Task)).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
