//! Object key layout for staged table data

/// Render a staging prefix template for `schema` and `table`
///
/// `{schema}` and `{table}` are substituted; trailing slashes on the template
/// are dropped so the result never ends with `/`.
pub fn staged_prefix(template: &str, schema: &str, table: &str) -> String {
    template
        .trim_end_matches('/')
        .replace("{schema}", schema)
        .replace("{table}", table)
}

/// Key prefix matching every object under `prefix`
pub fn prefix_dir(prefix: &str) -> String {
    format!("{prefix}/")
}

/// `s3a://` location Hive uses for an external table rooted at `prefix`
pub fn external_location(bucket: &str, prefix: &str) -> String {
    format!("s3a://{bucket}/{prefix}/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PREFIX_TEMPLATE;

    #[test]
    fn test_staged_prefix() {
        assert_eq!(
            staged_prefix(DEFAULT_PREFIX_TEMPLATE, "s", "t"),
            "trino/s/t"
        );
        assert_eq!(
            staged_prefix("landing/{table}/v1//", "s", "t"),
            "landing/t/v1"
        );
        assert_eq!(staged_prefix("fixed/", "s", "t"), "fixed");
    }

    #[test]
    fn test_locations() {
        assert_eq!(prefix_dir("trino/s/t"), "trino/s/t/");
        assert_eq!(
            external_location("bucket", "trino/s/t"),
            "s3a://bucket/trino/s/t/"
        );
    }
}
