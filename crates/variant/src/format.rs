//! Formatting knobs shared by conversions and serializers.

/// Layout of rendered output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SerializeOption {
    /// Compact form; also the canonical string used by the comparer.
    #[default]
    None,
    /// Human oriented, two-space indentation.
    Indented,
}

/// Culture-like settings for number parsing and formatting in conversions.
///
/// Canonical strings (`Display`, `format`) are always invariant; the provider
/// only affects explicit string conversions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormatProvider {
    pub decimal_separator: char,
}

impl FormatProvider {
    /// `.` as decimal separator.
    pub const INVARIANT: Self = Self {
        decimal_separator: '.',
    };

    pub const fn invariant() -> &'static Self {
        &Self::INVARIANT
    }

    pub fn with_decimal_separator(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }

    pub(crate) fn is_invariant(&self) -> bool {
        self.decimal_separator == '.'
    }

    /// Rewrites localized number text into invariant form.
    pub(crate) fn normalize_number<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        if self.is_invariant() {
            std::borrow::Cow::Borrowed(text)
        } else {
            std::borrow::Cow::Owned(text.replace(self.decimal_separator, "."))
        }
    }

    /// Rewrites invariant number text into this provider's form.
    pub(crate) fn localize_number(&self, text: String) -> String {
        if self.is_invariant() {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

impl Default for FormatProvider {
    fn default() -> Self {
        Self::INVARIANT
    }
}
