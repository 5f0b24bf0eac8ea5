/// Column-major dense matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mat {
    pub data: Vec<f64>,
    pub m: usize,
    pub n: usize,
}

impl Mat {
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            data: vec![0.0; m * n],
            m,
            n,
        }
    }

    /// Builds a matrix from row slices, convenient for tests and small fixtures.
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let m = rows.len();
        let n = rows.first().map_or(0, |row| row.len());
        let mut mat = Self::new(m, n);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), n, "ragged rows");
            for (j, &value) in row.iter().enumerate() {
                mat[(i, j)] = value;
            }
        }
        mat
    }

    pub fn col(&self, j: usize) -> &[f64] {
        let start = j * self.m;
        &self.data[start..start + self.m]
    }

    pub fn col_mut(&mut self, j: usize) -> &mut [f64] {
        let start = j * self.m;
        &mut self.data[start..start + self.m]
    }

    /// Copies row `i` out; rows are strided in column-major storage.
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.n).map(|j| self[(i, j)]).collect()
    }

    /// Resets to the identity (on the leading square block).
    pub fn set_identity(&mut self) {
        self.data.fill(0.0);
        for i in 0..self.m.min(self.n) {
            self[(i, i)] = 1.0;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.m
    }

    pub fn cols(&self) -> usize {
        self.n
    }
}

impl std::ops::Index<(usize, usize)> for Mat {
    type Output = f64;
    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index.1 * self.m + index.0]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Mat {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index.1 * self.m + index.0]
    }
}

impl std::fmt::Display for Mat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.m {
            for j in 0..self.n {
                write!(f, "{:10.4} ", self[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_major_layout() {
        let mat = Mat::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        assert_eq!(mat.rows(), 2);
        assert_eq!(mat.cols(), 3);
        assert_eq!(mat.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(mat.col(1), &[2.0, 5.0]);
        assert_eq!(mat.row(1), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_set_identity() {
        let mut mat = Mat::from_rows(&[&[7.0, 7.0], &[7.0, 7.0]]);
        mat.set_identity();
        assert_eq!(mat.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
    }
}
