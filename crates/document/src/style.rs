//! CSS-like `style` attribute helpers for layer visibility.

/// Layer visibility as expressed through the `display` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

impl Visibility {
    /// The `display` value written for this visibility.
    pub fn display_value(self) -> &'static str {
        match self {
            Visibility::Hidden => "none",
            Visibility::Visible => "inline",
        }
    }
}

/// Rewrite a style string so its only `display` declaration matches
/// `visibility`. The new declaration is placed first; all other declarations
/// keep their order.
pub fn with_display(style: Option<&str>, visibility: Visibility) -> String {
    let mut declarations = vec![format!("display:{}", visibility.display_value())];
    declarations.extend(
        declarations_of(style.unwrap_or_default())
            .filter(|(property, _)| !property.eq_ignore_ascii_case("display"))
            .map(|(property, value)| format!("{property}:{value}")),
    );
    declarations.join(";")
}

/// Visibility implied by a style string. A missing `display` declaration
/// means the group is shown.
pub fn visibility_of(style: Option<&str>) -> Visibility {
    let display = declarations_of(style.unwrap_or_default())
        .filter(|(property, _)| property.eq_ignore_ascii_case("display"))
        .last()
        .map(|(_, value)| value);

    match display {
        Some(value) if value.eq_ignore_ascii_case("none") => Visibility::Hidden,
        _ => Visibility::Visible,
    }
}

fn declarations_of(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        let property = property.trim();
        if property.is_empty() {
            return None;
        }
        Some((property, value.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_replaces_existing_display() {
        let style = with_display(Some("display:inline;fill:#ff0000"), Visibility::Hidden);
        assert_eq!(style, "display:none;fill:#ff0000");
    }

    #[test]
    fn test_show_moves_display_to_front() {
        let style = with_display(Some("opacity:0.5; display : none ;"), Visibility::Visible);
        assert_eq!(style, "display:inline;opacity:0.5");
    }

    #[test]
    fn test_missing_style_gets_display_only() {
        assert_eq!(with_display(None, Visibility::Hidden), "display:none");
        assert_eq!(with_display(Some(""), Visibility::Visible), "display:inline");
    }

    #[test]
    fn test_duplicate_display_declarations_collapse() {
        let style = with_display(
            Some("display:none;stroke:black;display:block"),
            Visibility::Visible,
        );
        assert_eq!(style, "display:inline;stroke:black");
    }

    #[test]
    fn test_visibility_of() {
        assert_eq!(visibility_of(None), Visibility::Visible);
        assert_eq!(visibility_of(Some("fill:red")), Visibility::Visible);
        assert_eq!(visibility_of(Some("display:none")), Visibility::Hidden);
        assert_eq!(
            visibility_of(Some("display:none;display:inline")),
            Visibility::Visible
        );
    }
}
