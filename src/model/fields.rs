use crate::model::extended::ObjectType;

/// How an extended field's text value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Strict `true` / `false`
    Bool,
    /// Date in the configured format, sent as a remote timestamp
    Date,
    /// Sibling index
    Position,
    /// Free text, one of the listed values
    Choice(&'static [&'static str]),
    /// Multi-line block between the description markers
    Description,
}

/// One editable field of an extended section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical field name
    pub name: &'static str,
    /// Name written in rendered sections
    pub display: &'static str,
    /// Remote API field
    pub api: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, api: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        display: name,
        api,
        kind,
    }
}

const VISIBILITY: &[&str] = &["disabled", "members", "observers", "org", "public"];

pub const BOARD_FIELDS: &[FieldSpec] = &[
    field("Name", "name", FieldKind::Text),
    field("Description", "desc", FieldKind::Description),
    field("Closed", "closed", FieldKind::Bool),
    field(
        "Permission Level",
        "prefs/permissionLevel",
        FieldKind::Choice(&["private", "org", "public"]),
    ),
    field("Self Join", "prefs/selfJoin", FieldKind::Bool),
    field("Card Covers", "prefs/cardCovers", FieldKind::Bool),
    field("Hide Votes", "prefs/hideVotes", FieldKind::Bool),
    field(
        "Invitations",
        "prefs/invitations",
        FieldKind::Choice(&["members", "admins"]),
    ),
    field("Voting", "prefs/voting", FieldKind::Choice(VISIBILITY)),
    field("Comments", "prefs/comments", FieldKind::Choice(VISIBILITY)),
    field(
        "Card Aging",
        "prefs/cardAging",
        FieldKind::Choice(&["regular", "pirate"]),
    ),
    field(
        "Calendar Feed",
        "prefs/calendarFeedEnabled",
        FieldKind::Bool,
    ),
];

pub const LIST_FIELDS: &[FieldSpec] = &[
    field("Name", "name", FieldKind::Text),
    field("Closed", "closed", FieldKind::Bool),
    field("Position", "pos", FieldKind::Position),
    field("Subscribed", "subscribed", FieldKind::Bool),
];

pub const CARD_FIELDS: &[FieldSpec] = &[
    field("Name", "name", FieldKind::Text),
    field("Description", "desc", FieldKind::Description),
    field("Closed", "closed", FieldKind::Bool),
    field("Position", "pos", FieldKind::Position),
    field("Subscribed", "subscribed", FieldKind::Bool),
    FieldSpec {
        name: "Start",
        display: "Start Date",
        api: "start",
        kind: FieldKind::Date,
    },
    FieldSpec {
        name: "Due",
        display: "Due Date",
        api: "due",
        kind: FieldKind::Date,
    },
    field("Due Complete", "dueComplete", FieldKind::Bool),
];

pub fn fields_for(object: ObjectType) -> &'static [FieldSpec] {
    match object {
        ObjectType::Board => BOARD_FIELDS,
        ObjectType::List => LIST_FIELDS,
        ObjectType::Card => CARD_FIELDS,
    }
}

/// Canonical name for a field as written by the user
pub fn normalise_field_name(name: &str) -> &str {
    let name = name.trim().trim_end_matches(':').trim();
    match name {
        "Start Date" => "Start",
        "Due Date" => "Due",
        other => other,
    }
}

/// Find the field an (un-normalised) name refers to
pub fn lookup(object: ObjectType, name: &str) -> Option<&'static FieldSpec> {
    let name = normalise_field_name(name);
    fields_for(object).iter().find(|f| f.name == name)
}
