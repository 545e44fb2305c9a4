use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "TASKY_DATA_DIR";

/// Pick the data directory: explicit flag, then `$TASKY_DATA_DIR`, then
/// `$XDG_DATA_HOME/tasky`, then `$HOME/.local/share/tasky`. Falls back to
/// `./.tasky` when none of those are set.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    resolve_with(explicit, |name| std::env::var_os(name).map(PathBuf::from))
}

fn resolve_with(explicit: Option<&Path>, env: impl Fn(&str) -> Option<PathBuf>) -> PathBuf {
    let non_empty = |name: &str| env(name).filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(dir) = non_empty(DATA_DIR_ENV) {
        return dir;
    }
    if let Some(xdg) = non_empty("XDG_DATA_HOME") {
        return xdg.join("tasky");
    }
    if let Some(home) = non_empty("HOME") {
        return home.join(".local").join("share").join("tasky");
    }
    PathBuf::from(".tasky")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<PathBuf> {
        let map: HashMap<String, PathBuf> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PathBuf::from(v)))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_flag_wins() {
        let env = env_of(&[(DATA_DIR_ENV, "/env"), ("HOME", "/home/u")]);
        assert_eq!(
            resolve_with(Some(Path::new("/flag")), env),
            PathBuf::from("/flag")
        );
    }

    #[test]
    fn precedence_of_environment() {
        let all = env_of(&[
            (DATA_DIR_ENV, "/env"),
            ("XDG_DATA_HOME", "/xdg"),
            ("HOME", "/home/u"),
        ]);
        assert_eq!(resolve_with(None, all), PathBuf::from("/env"));

        let xdg = env_of(&[("XDG_DATA_HOME", "/xdg"), ("HOME", "/home/u")]);
        assert_eq!(resolve_with(None, xdg), PathBuf::from("/xdg/tasky"));

        let home = env_of(&[("XDG_DATA_HOME", ""), ("HOME", "/home/u")]);
        assert_eq!(
            resolve_with(None, home),
            PathBuf::from("/home/u/.local/share/tasky")
        );

        assert_eq!(resolve_with(None, env_of(&[])), PathBuf::from(".tasky"));
    }
}
