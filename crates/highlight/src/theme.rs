/// Which of `system|light|dark` the host prefers; propagated via
/// `FileRenderer::set_theme_type` without invalidating the cache on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemePreference {
    System,
    Light,
    Dark,
}

/// A highlighter may be configured with one theme or a light/dark pair; the
/// renderer selects which to emit based on `ThemePreference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeSet {
    Single(String),
    Pair { light: String, dark: String },
}

impl ThemeSet {
    /// Resolve which theme name to request, given the host's preference and
    /// (for `System`) whichever branch the host's media query resolved to.
    pub fn resolve(&self, preference: ThemePreference, system_is_dark: bool) -> &str {
        match (self, preference) {
            (ThemeSet::Single(name), _) => name,
            (ThemeSet::Pair { light, .. }, ThemePreference::Light) => light,
            (ThemeSet::Pair { dark, .. }, ThemePreference::Dark) => dark,
            (ThemeSet::Pair { light, dark }, ThemePreference::System) => {
                if system_is_dark {
                    dark
                } else {
                    light
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_theme_ignores_preference() {
        let set = ThemeSet::Single("nord".into());
        assert_eq!(set.resolve(ThemePreference::Dark, false), "nord");
    }

    #[test]
    fn pair_follows_system_preference() {
        let set = ThemeSet::Pair {
            light: "github-light".into(),
            dark: "github-dark".into(),
        };
        assert_eq!(set.resolve(ThemePreference::System, true), "github-dark");
        assert_eq!(set.resolve(ThemePreference::System, false), "github-light");
        assert_eq!(set.resolve(ThemePreference::Light, true), "github-light");
    }
}
