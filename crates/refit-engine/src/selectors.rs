//! The stable structural/attribute matchers for the host application.
//!
//! Everything the engine locates in the host document is anchored on these.
//! They are the version-compatibility surface: when the host renames a class,
//! this is the file that changes.

use refit_dom::{Matcher, Selector};

/// The ordered tab list inside the rail.
pub fn tab_list() -> Selector {
    Selector::new(
        Matcher::tag("div")
            .class("p-tab_rail__tab_menu")
            .attr("role", "tablist"),
    )
}

/// The secondary navigation area mirror buttons are inserted into.
pub fn history_navigation() -> Selector {
    Selector::new(Matcher::tag("div").attr("aria-label", "History Navigation"))
}

/// The sidebar rail itself.
pub fn tab_rail() -> Selector {
    Selector::new(Matcher::any().class("p-tab_rail"))
}

/// A tab's visible label.
pub fn tab_label() -> Selector {
    Selector::new(Matcher::any().class("p-tab_rail__button__label"))
}

/// A tab's icon.
pub fn tab_icon() -> Selector {
    Selector::new(Matcher::tag("svg"))
}

/// The rail button carrying a given accessible label.
pub fn rail_button(aria_label: &str) -> Selector {
    Selector::new(Matcher::any().class("p-tab_rail"))
        .descendant(Matcher::tag("button").attr("aria-label", aria_label))
}

/// The workspace switcher control.
pub fn workspace_switcher() -> Selector {
    Selector::new(Matcher::any().class("p-account_switcher"))
}

/// The host's modal overlay (present while any overlay is open).
pub fn modal_overlay() -> Selector {
    Selector::new(Matcher::any().class("ReactModal__Overlay"))
}

/// One workspace row inside the open switcher menu.
pub fn switcher_workspace_row() -> Selector {
    Selector::new(Matcher::any().class("p_team-switcher-menu__item__team"))
        .descendant(Matcher::any().class("p_team-switcher-menu__item__team"))
}

/// A workspace row's icon.
pub fn workspace_row_icon() -> Selector {
    Selector::new(Matcher::any().class("p-account_switcher__row_icon"))
}

/// A workspace row's URL text.
pub fn workspace_row_url() -> Selector {
    Selector::new(Matcher::any().class("p-account_switcher__row_url"))
}

/// The "add a workspace" row inside the open switcher menu.
pub fn add_workspace_item() -> Selector {
    Selector::new(Matcher::any().class("p-team_switcher_menu__item--add"))
}

/// The workspace-layout control strip (the instance the host recreates on
/// view changes).
pub fn control_strip_toolbar() -> Selector {
    Selector::new(Matcher::any().class("p-client_workspace__layout"))
        .descendant(Matcher::any().class("p-control_strip").attr("role", "toolbar"))
}

/// The create button inside the control strip.
pub fn create_button() -> Selector {
    control_strip_toolbar().descendant(Matcher::any().class("p-control_strip__create_button"))
}

/// The create button's icon.
pub fn create_button_icon() -> Selector {
    Selector::new(Matcher::any().class("p-control_strip__create_button__icon"))
        .descendant(Matcher::tag("svg"))
}

/// The avatar/status container inside the control strip.
pub fn avatar_container() -> Selector {
    Selector::new(Matcher::any().attr("aria-label", "Control strip")).child(Matcher::tag("div"))
}

/// The right-hand container of the top navigation.
pub fn top_nav_right() -> Selector {
    Selector::new(Matcher::any().class("p-ia4_top_nav__right_container"))
}

/// An element by its engine-assigned id.
pub fn by_id(id: &str) -> Selector {
    Selector::new(Matcher::any().id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_rendering_is_stable() {
        assert_eq!(
            tab_list().to_css(),
            "div.p-tab_rail__tab_menu[role=\"tablist\"]"
        );
        assert_eq!(
            avatar_container().to_css(),
            "*[aria-label=\"Control strip\"] > div"
        );
        assert_eq!(
            rail_button("Home").to_css(),
            "*.p-tab_rail button[aria-label=\"Home\"]"
        );
    }
}
