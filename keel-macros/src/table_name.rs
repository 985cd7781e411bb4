use convert_case::{Case, Casing};

/// Snake case plural of a struct name: `UserAccount` becomes `user_accounts`.
pub(crate) fn default_table_name(ident: &str) -> String {
    pluralize(&ident.to_case(Case::Snake))
}

fn pluralize(singular: &str) -> String {
    if singular.ends_with('s') {
        singular.to_string()
    } else if let Some(stem) = singular.strip_suffix('y') {
        format!("{stem}ies")
    } else {
        format!("{singular}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plurals() {
        assert_eq!(default_table_name("User"), "users");
        assert_eq!(default_table_name("UserAccount"), "user_accounts");
        assert_eq!(default_table_name("Category"), "categories");
        assert_eq!(default_table_name("Status"), "status");
    }
}
