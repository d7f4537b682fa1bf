//! Glob patterns as path predicates.

use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::error::WatchError;

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compile `pattern` into a predicate for [`Filter`](crate::combinators::Filter).
///
/// `*` and `?` never cross a `/`; a whole-component `**` matches any number
/// of directories, so `**/boo` accepts `/tmp/foo/boo` but not
/// `/tmp/boorish`.
///
/// # Errors
///
/// Returns [`WatchError::InvalidGlob`] if the pattern does not compile.
pub fn glob(
    pattern: &str,
) -> Result<impl FnMut(&Path) -> bool + Send + Clone + 'static, WatchError> {
    let compiled = Pattern::new(pattern).map_err(|err| WatchError::invalid_glob(pattern, err))?;
    Ok(move |path: &Path| compiled.matches_path_with(path, OPTIONS))
}
