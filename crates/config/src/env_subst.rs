/// Replace `${ENV_VAR}` placeholders in config string values.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let var_name = &after[..end];
                match std::env::var(var_name) {
                    Ok(val) => result.push_str(&val),
                    // Leave unresolved placeholder as-is.
                    Err(_) => {
                        result.push_str("${");
                        result.push_str(var_name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            // Malformed (`${}` or unclosed) — emit the rest literally.
            _ => {
                result.push_str(&rest[start..]);
                return result;
            },
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
// set_var/remove_var are unsafe in edition 2024; fine in single-purpose tests.
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        unsafe { std::env::set_var("PARLEY_TEST_VAR", "hello") };
        assert_eq!(substitute_env("key=${PARLEY_TEST_VAR}"), "key=hello");
        unsafe { std::env::remove_var("PARLEY_TEST_VAR") };
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env("${PARLEY_NONEXISTENT_XYZ}"),
            "${PARLEY_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }

    #[test]
    fn unclosed_placeholder_kept_literal() {
        assert_eq!(substitute_env("tail ${OOPS"), "tail ${OOPS");
    }
}
