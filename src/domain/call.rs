//! The shared call representation passed between the builder form, the hex
//! inspector and the submission path.

/// One argument of a call. `value` stays `None` until the user types
/// something; it is an unencoded, user-facing string until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArg {
    pub name: String,
    pub ty: u32,
    pub value: Option<String>,
}

/// A section/method pair plus its ordered arguments. Both the builder and
/// the inspector produce and consume this one value; neither owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallModel {
    pub section: String,
    pub method: String,
    pub args: Vec<CallArg>,
}

impl CallModel {
    /// `section.method`, for display.
    pub fn path(&self) -> String {
        format!("{}.{}", self.section, self.method)
    }
}
