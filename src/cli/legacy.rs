//! Slash-style switches (`/y`, `/n`, `/path=DIR`).

use std::ffi::OsString;

/// Rewrite slash-style switches into their long-flag form.
///
/// The first argument (the program name) and anything that is not an
/// exact switch pass through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();
    normalized.extend(args.map(normalize_one));
    normalized
}

fn normalize_one(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    let lower = text.to_ascii_lowercase();
    match lower.as_str() {
        "/y" => "--yes".into(),
        "/n" => "--no".into(),
        _ if lower.starts_with("/path=") => format!("--path={}", &text["/path=".len()..]).into(),
        _ => arg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(args: &[&str]) -> Vec<String> {
        normalize_args(args.iter().copied())
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn rewrites_switches() {
        assert_eq!(
            normalized(&["actor", "/Y", "/PATH=D:\\ACT"]),
            vec!["actor", "--yes", "--path=D:\\ACT"]
        );
        assert_eq!(normalized(&["actor", "/n"]), vec!["actor", "--no"]);
    }

    #[test]
    fn program_name_is_untouched() {
        assert_eq!(normalized(&["/y"]), vec!["/y"]);
    }

    #[test]
    fn other_arguments_pass_through() {
        assert_eq!(
            normalized(&["actor", "--manifest", "/yaml/components.json", "/path"]),
            vec!["actor", "--manifest", "/yaml/components.json", "/path"]
        );
    }

    #[test]
    fn empty_path_value_is_kept() {
        assert_eq!(normalized(&["actor", "/path="]), vec!["actor", "--path="]);
    }
}
