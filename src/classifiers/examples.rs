use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};


pub const EDGE_CALLS: &str = "calls";
pub const EDGE_BASE_CLASS: &str = "base_class";


/// Routing decision for a query: whether it asks about relationship topology,
/// which edge type it is about (`None` = any), and which way to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryIntent {
    pub is_structural: bool,
    pub edge_type: Option<&'static str>,
    pub use_successors: bool,
}

impl QueryIntent {
    pub const SEMANTIC: Self = Self {
        is_structural: false,
        edge_type: None,
        use_successors: true,
    };

    pub const fn structural(edge_type: Option<&'static str>, use_successors: bool) -> Self {
        Self {
            is_structural: true,
            edge_type,
            use_successors,
        }
    }
}


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    Semantic,
    StructuralSuccessorsCalls,
    StructuralPredecessorsCalls,
    StructuralSuccessorsBaseClass,
}

impl IntentLabel {
    #[must_use]
    pub const fn intent(self) -> QueryIntent {
        match self {
            Self::Semantic => QueryIntent::SEMANTIC,
            Self::StructuralSuccessorsCalls => QueryIntent::structural(Some(EDGE_CALLS), true),
            Self::StructuralPredecessorsCalls => QueryIntent::structural(Some(EDGE_CALLS), false),
            Self::StructuralSuccessorsBaseClass => QueryIntent::structural(Some(EDGE_BASE_CLASS), true),
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const ALL: [Self; 4] = [
        Self::Semantic,
        Self::StructuralSuccessorsCalls,
        Self::StructuralPredecessorsCalls,
        Self::StructuralSuccessorsBaseClass,
    ];
}


/// Fixed, hand-curated training set. The label set is closed.
pub const STRUCTURAL_INTENT_EXAMPLES: &[(&str, IntentLabel)] = &[

    ("How do I parse JSON from a string?", IntentLabel::Semantic),
    ("Serialize Python object to JSON", IntentLabel::Semantic),
    ("Work with file paths and directories", IntentLabel::Semantic),
    ("Regular expression match and search", IntentLabel::Semantic),
    ("Split string by regex pattern", IntentLabel::Semantic),
    ("Read and write CSV files", IntentLabel::Semantic),
    ("Default dictionary with default value", IntentLabel::Semantic),
    ("Partial function application", IntentLabel::Semantic),
    ("Encode and decode base64", IntentLabel::Semantic),
    ("Thread-safe queue", IntentLabel::Semantic),
    ("Abstract base class and metaclass", IntentLabel::Semantic),
    ("Deep copy and shallow copy", IntentLabel::Semantic),
    ("Context manager and with statement", IntentLabel::Semantic),
    ("How do I use inheritance in Python?", IntentLabel::Semantic),
    ("Explain callbacks and async", IntentLabel::Semantic),
    ("What is the difference between list and tuple?", IntentLabel::Semantic),
    ("re.compile", IntentLabel::Semantic),
    ("base64.b64encode", IntentLabel::Semantic),

    ("What does json.load call internally?", IntentLabel::StructuralSuccessorsCalls),
    ("What does json.load call?", IntentLabel::StructuralSuccessorsCalls),
    ("Which function does json.load invoke?", IntentLabel::StructuralSuccessorsCalls),
    (
        "What does the JSON function that deserializes a file-like object call internally?",
        IntentLabel::StructuralSuccessorsCalls,
    ),
    ("What does X call?", IntentLabel::StructuralSuccessorsCalls),
    ("What does pathlib.Path call?", IntentLabel::StructuralSuccessorsCalls),

    ("What functions call json.loads?", IntentLabel::StructuralPredecessorsCalls),
    ("What calls json.loads?", IntentLabel::StructuralPredecessorsCalls),
    ("Who calls json.loads?", IntentLabel::StructuralPredecessorsCalls),
    (
        "Which function calls the one that deserializes a string containing a JSON document?",
        IntentLabel::StructuralPredecessorsCalls,
    ),
    ("What functions call this?", IntentLabel::StructuralPredecessorsCalls),
    ("Callers of json.loads", IntentLabel::StructuralPredecessorsCalls),

    ("What classes does pathlib.Path inherit from?", IntentLabel::StructuralSuccessorsBaseClass),
    ("What does Path inherit from?", IntentLabel::StructuralSuccessorsBaseClass),
    ("What is the base class of pathlib.Path?", IntentLabel::StructuralSuccessorsBaseClass),
    (
        "What is the base class of the pathlib class that can make system calls on path objects?",
        IntentLabel::StructuralSuccessorsBaseClass,
    ),
    ("What does pathlib.Path inherit from?", IntentLabel::StructuralSuccessorsBaseClass),
];
