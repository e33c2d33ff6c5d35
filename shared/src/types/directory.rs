use serde_json::{Map, Value};

/// The document collections exposed by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Locations,
    Teachers,
    Timetable,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Locations,
        Collection::Teachers,
        Collection::Timetable,
    ];

    /// Collection name, used both as the storage key and as the URL segment.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Locations => "locations",
            Collection::Teachers => "teachers",
            Collection::Timetable => "timetable",
        }
    }

    /// Singular, capitalised label used in response messages.
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Locations => "Location",
            Collection::Teachers => "Teacher",
            Collection::Timetable => "Timetable entry",
        }
    }

    /// Verb used for creation in messages: locations are "created",
    /// teachers and timetable entries are "added".
    pub fn create_verb(&self) -> &'static str {
        match self {
            Collection::Locations => "create",
            Collection::Teachers | Collection::Timetable => "add",
        }
    }

    /// `"<Label> created successfully"` / `"<Label> added successfully"`.
    pub fn created_message(&self) -> String {
        let done = match self {
            Collection::Locations => "created",
            Collection::Teachers | Collection::Timetable => "added",
        };
        format!("{} {} successfully", self.label(), done)
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Locations => &["name", "building", "floor", "type"],
            Collection::Teachers => &[
                "name",
                "designation",
                "department",
                "subjects",
                "email",
                "office",
                "officeHours",
            ],
            Collection::Timetable => &[
                "course", "title", "day", "time", "room", "teacher", "semester",
            ],
        }
    }

    /// First required field that is absent or blank in `doc`.
    pub fn missing_required_field(&self, doc: &Map<String, Value>) -> Option<&'static str> {
        self.required_fields()
            .iter()
            .copied()
            .find(|field| doc.get(*field).is_none_or(is_blank))
    }

    /// Apply per-collection shape fixes before a document is stored.
    pub fn normalize(&self, doc: &mut Map<String, Value>) {
        if *self == Collection::Teachers {
            if let Some(subjects) = doc.get_mut("subjects") {
                if !subjects.is_array() {
                    let single = subjects.take();
                    *subjects = Value::Array(vec![single]);
                }
            }
        }
    }
}

/// Null, `false`, zero and the empty string count as "not provided".
/// Arrays and objects always count as provided.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
