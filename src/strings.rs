use std::sync::LazyLock;

use regex::Regex;

/// Replaces string array references with their actual string values.
///
/// Some P.A.C.K.E.R. variants create string arrays like:
/// ```javascript
/// var _0x1234=["string1","string2","string3"];
/// // Later referenced as: _0x1234[0], _0x1234[1], _0x1234[2]
/// ```
///
/// The first such declaration is parsed, every `name[i]` after it becomes
/// the quoted literal, and the declaration (with anything before it) is
/// dropped. Source without a declaration comes back unchanged.
pub(crate) fn resolve_string_arrays(source: &str) -> String {
    static STRING_REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"var *(_\w+)\=\["(.*?)"\];"#).unwrap());

    let Some(caps) = STRING_REGEX.captures(source) else {
        return source.to_owned();
    };
    let (Some(declaration), Some(name), Some(strings)) = (caps.get(0), caps.get(1), caps.get(2))
    else {
        return source.to_owned();
    };

    strings
        .as_str()
        .split("\",\"")
        .enumerate()
        .fold(source[declaration.end()..].to_owned(), |acc, (index, value)| {
            acc.replace(
                &format!("{}[{}]", name.as_str(), index),
                &format!("\"{}\"", value),
            )
        })
}
