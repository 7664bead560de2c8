//! Insertion-ordered stack of spectral index arrays
//!
//! The stack maps index names (`NDVI`, `NDRE`, ...) to 2-D `f64` arrays that
//! all share one shape. Insertion order is load-bearing: it fixes the feature
//! column order during clustering and the attribute column order in every
//! serialized output, so the stack is a small Vec-backed map rather than a
//! hash map.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Ordered collection of named spectral index arrays with a common shape.
#[derive(Debug, Clone, Default)]
pub struct IndexStack {
    entries: Vec<(String, Array2<f64>)>,
}

impl IndexStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an index array under `name` (normalized to uppercase).
    ///
    /// Re-inserting an existing name replaces the array in place, keeping the
    /// original position. The first insertion fixes the stack shape; later
    /// arrays must match it.
    pub fn insert(&mut self, name: impl Into<String>, array: Array2<f64>) -> Result<()> {
        let name = name.into().trim().to_uppercase();
        if name.is_empty() {
            return Err(Error::IndexStack("index name is empty".into()));
        }

        if let Some((er, ec)) = self.shape() {
            let (ar, ac) = array.dim();
            if (ar, ac) != (er, ec) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        } else {
            let (rows, cols) = array.dim();
            if rows == 0 || cols == 0 {
                return Err(Error::InvalidDimensions {
                    width: cols,
                    height: rows,
                });
            }
        }

        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = array;
        } else {
            self.entries.push((name, array));
        }
        Ok(())
    }

    /// Build a stack from `(name, array)` pairs, preserving order.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Array2<f64>)>,
        S: Into<String>,
    {
        let mut stack = Self::new();
        for (name, array) in entries {
            stack.insert(name, array)?;
        }
        Ok(stack)
    }

    /// Look up an index array by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        let name = name.trim().to_uppercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, a)| a.view())
    }

    /// Index names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, array)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ArrayView2<'_, f64>)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a.view()))
    }

    /// Number of indices in the stack.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack holds no indices.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Common `(rows, cols)` shape, or `None` while empty.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.entries.first().map(|(_, a)| a.dim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_insertion_order_preserved() {
        let mut stack = IndexStack::new();
        stack.insert("ndvi", array![[0.1, 0.2]]).unwrap();
        stack.insert("NDRE", array![[0.3, 0.4]]).unwrap();
        stack.insert("si", array![[0.5, 0.6]]).unwrap();

        let names: Vec<&str> = stack.names().collect();
        assert_eq!(names, vec!["NDVI", "NDRE", "SI"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut stack = IndexStack::new();
        stack.insert("NDVI", array![[0.1]]).unwrap();
        stack.insert("NDWI", array![[0.2]]).unwrap();
        stack.insert("NDVI", array![[0.9]]).unwrap();

        let names: Vec<&str> = stack.names().collect();
        assert_eq!(names, vec!["NDVI", "NDWI"]);
        assert_eq!(stack.get("ndvi").unwrap()[[0, 0]], 0.9);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut stack = IndexStack::new();
        stack.insert("NDVI", Array2::zeros((2, 3))).unwrap();
        let err = stack.insert("NDWI", Array2::zeros((3, 2)));
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut stack = IndexStack::new();
        assert!(stack.insert("  ", array![[1.0]]).is_err());
    }
}
