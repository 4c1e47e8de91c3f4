use crate::config::RESET_ROLL;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ColumnSet {
    drops: Vec<u32>,
}

impl ColumnSet {
    pub(crate) fn for_width(css_width: f32, cell_size: f32) -> Self {
        Self {
            drops: vec![0; column_count(css_width, cell_size)],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.drops.len()
    }

    pub(crate) fn row(&self, column: usize) -> u32 {
        self.drops[column]
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> &[u32] {
        &self.drops
    }

    pub(crate) fn advance(&mut self, column: usize) {
        self.drops[column] = self.drops[column].saturating_add(1);
    }

    pub(crate) fn reset(&mut self, column: usize) {
        self.drops[column] = 0;
    }
}

pub(crate) fn column_count(css_width: f32, cell_size: f32) -> usize {
    if !css_width.is_finite() || cell_size <= 0.0 {
        return 1;
    }
    (css_width.max(0.0) / cell_size).floor() as usize + 1
}

pub(crate) fn wraps(below_fold: bool, roll: f64) -> bool {
    below_fold && roll > RESET_ROLL
}
