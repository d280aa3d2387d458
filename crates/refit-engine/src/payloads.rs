//! Style entry keys and their opaque payloads.
//!
//! Payload content is host-app CSS and passes through the engine untouched;
//! only the keys matter to the engine (keyed replace/remove semantics).

/// Temporary invisibility for discreetly probed overlays.
pub const PROBE_SUPPRESSION_KEY: &str = "rf-temporary-modal-content-style";
pub const PROBE_SUPPRESSION: &str = r#"
.ReactModal__Content { display: none !important; }
"#;

pub const SQUARE_OFF_KEY: &str = "rf-expand-workspace-to-edge";
pub const SQUARE_OFF: &str = r#"
.p-client_workspace { padding: 0 !important; }

.p-client_workspace__layout
{
  border-radius: 0px !important;
  border-bottom: none !important;
  border-right: none !important;
  border-top-left-radius: 0 !important;
}

.p-ia4_client .p-view_contents--primary,
.p-ia4_client .p-view_contents--secondary,
.p-ia4_client .p-view_contents--sidebar
{
  max-height: 100% !important;
}

.p-tab_rail
{
  border-top: 1px solid var(--dt_color-otl-ter) !important;
  padding-top: 15px;
}

.p-client_workspace__layout .p-control_strip[role="toolbar"]
{
  padding-bottom: 15px !important;
}
"#;

pub const HIDE_SIDEBAR_KEY: &str = "rf-hide-sidebar-style";
pub const HIDE_SIDEBAR: &str = r#"
.p-tab_rail { display: none !important; }

.p-client_workspace_wrapper { grid-template-columns: 0px auto !important; }

.p-client_workspace__layout { border-left: none !important; }
"#;

pub const HIDE_SWITCHER_KEY: &str = "rf-hide-workspace-switcher-style";
pub const HIDE_SWITCHER: &str = r#"
.p-tab_rail > div:first-child .p-account_switcher { display: none !important; }
"#;

pub const HIGHLIGHT_SWITCHER_KEY: &str = "rf-highlight-workspace-switcher-style";
pub const HIGHLIGHT_SWITCHER: &str = r#"
.p-tab_rail:has([data-qa="ellipsis-horizontal-filled"]) > div:first-child .p-account_switcher
{
  position: relative;
  height: 40px;
  width: 40px;
  border-radius: clamp(var(--dt_static_radius-base), min(22.222%, var(--dt_static_radius-xlarge)), var(--dt_static_radius-xlarge));
  box-shadow: 0px 0px 0px 2pt white;
}

.p-tab_rail > div:first-child .p-account_switcher
{
  position: relative;
  height: 28px;
  width: 28px;
  border-radius: clamp(var(--dt_static_radius-base), min(22.222%, var(--dt_static_radius-xlarge)), var(--dt_static_radius-xlarge));
  box-shadow: 0px 0px 0px 1.5pt white;
}

.p-tab_rail > div:first-child .p-account_switcher i { margin: 2px; }
"#;

pub const MOVE_CONTROL_STRIP_KEY: &str = "rf-move-create-button-style";
pub const MOVE_CONTROL_STRIP: &str = r#"
.p-client_workspace__layout .p-control_strip[role="toolbar"],
.p-control_strip[role="toolbar"] > div
{
  display: none !important;
}

.p-control_strip
{
  margin-top: 0px !important;
  position: relative;
  padding: 0px !important;
}

.c-tabs__tab_content:first-child { padding-top: 0px !important; }
"#;

pub const HIDE_CREATE_BUTTON_KEY: &str = "rf-hide-create-button-style";
pub const HIDE_CREATE_BUTTON: &str = r#"
[role="toolbar"] .p-control_strip__create_button { display: none !important; }
"#;

pub const AVATAR_NAV_KEY: &str = "rf-move-avatar-style";
pub const AVATAR_NAV: &str = r#"
.ReactModal__Content:has(.p-ia__main_menu__user),
.ReactModal__Content:has(.p-control_strip__user_tooltip)
{
  margin-top: 32px !important;
}

.p-ia__nav__user { display: flex; }

.p-ia4_top_nav__right_container > div:nth-child(1) { margin-right: 5px; }

.p-ia4_top_nav__right_container > div:nth-child(2),
.p-ia__nav__user__avatar > span.c-base_icon__width_only_container > img,
.p-ia__nav__user__avatar > span.c-base_icon__width_only_container
{
  height: 28px !important;
}

.p-ia__nav__user__avatar
{
  height: 28px !important;
  width: 28px !important;
  --avatar-image-size: 28px !important;
}

.p-ia__nav__user__status_icon
{
  width: 28px;
  height: 28px;
  padding: 0 0 0 6px;
  position: relative;
  background-color: transparent !important;
  margin-left: 4px !important;
}

.p-control_strip__circle_button { background-color: transparent; }

[aria-label="Control strip"][role="toolbar"] > div:nth-child(2)
{
  display: none !important;
}
"#;

pub const ADD_WORKSPACE_BUTTONS_KEY: &str = "rf-add-workspace-button-style";
pub const ADD_WORKSPACE_BUTTONS: &str = r#"
.p-tab_rail:has([data-qa="ellipsis-vertical-filled"]) .c-team_icon
{
  height: 24px !important;
  width: 24px !important;
  min-width: auto !important;
}

.p-tab_rail .p-team_switcher_menu__item--add { padding: 0px !important; }

.p-tab_rail .p-add_team_label > div:nth-child(2) { display: none !important; }

#rf-create-workspace-button { display: flex !important; }

.active-managed-focus-container .p-control_strip__circle_button
{
  background-color: transparent;
}
.active-managed-focus-container .p-control_strip__circle_button:active
{
  background-color: revert !important;
}
"#;

/// Class that visually suppresses a tab or mirror button while leaving it in
/// the DOM.
pub const TAB_HIDDEN_CLASS: &str = "rf-tab-button-hidden";

pub const TAB_BUTTONS_KEY: &str = "rf-tab-buttons-style";
pub const TAB_BUTTONS: &str = r#"
.rf-tab-button-hidden { display: none !important; }

.rf-tab-button
{
  margin-left: 4px !important;
  margin-right: 0px !important;
}

.rf-tab-button:first-child { margin-left: 7px !important; }

.ReactModal__Content:has([aria-label="More"][role="menu"])
{
  margin-top: 32px !important;
}

.ReactModal__Content:has([aria-label="More"][role="menu"]) .p-more_menu__container
{
  max-height: 85vh;
}
"#;

/// Appended to [`TAB_BUTTONS`] when every tab ended up hidden: an empty rail
/// is uglier than a missing one.
pub const TAB_RAIL_CHROME_SUPPRESSION: &str = r#"
.p-tab_rail > div:nth-child(2) { display: none !important; }
"#;
