use crate::bind::BindValue;

/// Placeholder and parameter accumulator threaded through one compilation.
///
/// Every placeholder is assigned by pre-incrementing `last_position`, and the
/// matching value is appended in the same step, so ordinals stay globally
/// unique and contiguous across the recursive walk. A cursor belongs to a
/// single `compose` call and is never shared.
#[derive(Debug, Default)]
pub struct CompilationCursor {
    offset: usize,
    last_position: usize,
    cte_count: usize,
    parameters: Vec<BindValue>,
}

impl CompilationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts numbering after `offset` placeholders; only the values pushed
    /// here are collected. Lets clause builders be exercised mid-statement.
    #[cfg(test)]
    pub(crate) fn with_offset(offset: usize) -> Self {
        Self {
            offset,
            last_position: offset,
            ..Self::default()
        }
    }

    /// Binds `value` to the next placeholder and returns its ordinal.
    pub fn push(&mut self, value: impl Into<BindValue>) -> usize {
        self.parameters.push(value.into());
        self.last_position += 1;
        debug_assert_eq!(self.parameters.len() + self.offset, self.last_position);
        self.last_position
    }

    /// Binds `value` and returns the `$n` placeholder text.
    pub fn placeholder(&mut self, value: impl Into<BindValue>) -> String {
        format!("${}", self.push(value))
    }

    /// Next nested-entity CTE alias (`nested_1`, `nested_2`, ...).
    pub fn next_alias(&mut self) -> String {
        self.cte_count += 1;
        format!("nested_{}", self.cte_count)
    }

    pub fn last_position(&self) -> usize {
        self.last_position
    }

    pub fn cte_count(&self) -> usize {
        self.cte_count
    }

    pub fn parameters(&self) -> &[BindValue] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<BindValue> {
        self.parameters
    }
}
