
use indexmap::IndexMap;
use itertools::Itertools;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ContrastError {
    #[error("contrast definition is empty")]
    Empty,
    #[error("malformed term {term:?} in contrast {contrast:?}")]
    MalformedTerm { contrast: String, term: String },
    #[error("contrast {contrast} must compare at least two groups, found {found}")]
    TooFewGroups { contrast: String, found: usize }
}

/// A named linear combination over groups, e.g. `treated - control`.
#[derive(Clone, Debug, PartialEq)]
pub struct Contrast {
    /// Label used in all outputs
    name: String,
    /// Group name to coefficient, zero coefficients are dropped
    coefficients: IndexMap<String, f64>
}

impl Contrast {
    /// Creates a contrast from explicit coefficients.
    /// Repeated groups are summed and zero coefficients are dropped.
    /// # Errors
    /// * if fewer than two groups carry a non-zero coefficient
    pub fn new<S: Into<String>>(name: impl Into<String>, coefficients: Vec<(S, f64)>) -> Result<Self, ContrastError> {
        let name: String = name.into();
        let mut merged: IndexMap<String, f64> = Default::default();
        for (group, coef) in coefficients.into_iter() {
            *merged.entry(group.into()).or_insert(0.0) += coef;
        }
        merged.retain(|_, c| *c != 0.0);

        if merged.len() < 2 {
            return Err(ContrastError::TooFewGroups { contrast: name, found: merged.len() });
        }
        Ok(Self {
            name,
            coefficients: merged
        })
    }

    /// Simple pairwise contrast: `group1 - group2`
    pub fn pairwise(group1: &str, group2: &str) -> Result<Self, ContrastError> {
        Self::new(format!("{group1}-{group2}"), vec![(group1, 1.0), (group2, -1.0)])
    }

    /// Every pairwise contrast `a-b` with `a` listed before `b`
    pub fn all_pairwise(groups: &[String]) -> Result<Vec<Self>, ContrastError> {
        groups.iter()
            .tuple_combinations()
            .map(|(group1, group2)| Self::pairwise(group1, group2))
            .collect()
    }

    // getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coefficients(&self) -> &IndexMap<String, f64> {
        &self.coefficients
    }
}

impl FromStr for Contrast {
    type Err = ContrastError;

    /// Parses `name=expr` or just `expr`, where `expr` is something like `a-b` or `a - 0.5*b - 0.5*c`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, expression) = match s.split_once('=') {
            Some((n, e)) => (n.trim().to_string(), e),
            None => (s.split_whitespace().collect::<String>(), s)
        };
        let compact: String = expression.split_whitespace().collect();
        if compact.is_empty() || name.is_empty() {
            return Err(ContrastError::Empty);
        }

        let malformed = |term: &str| ContrastError::MalformedTerm { contrast: s.to_string(), term: term.to_string() };

        // split into signed terms
        let mut terms: Vec<(f64, String)> = vec![];
        let mut sign = 1.0;
        let mut current = String::new();
        for c in compact.chars() {
            match c {
                '+' | '-' => {
                    if !current.is_empty() {
                        terms.push((sign, std::mem::take(&mut current)));
                    } else if !terms.is_empty() {
                        // two operators in a row, e.g. "a+-b"
                        return Err(malformed(&c.to_string()));
                    }
                    sign = if c == '-' { -1.0 } else { 1.0 };
                },
                _ => current.push(c)
            }
        }
        if current.is_empty() {
            return Err(malformed(&compact));
        }
        terms.push((sign, current));

        let mut coefficients: Vec<(String, f64)> = Vec::with_capacity(terms.len());
        for (sign, term) in terms.into_iter() {
            let (coef, group) = match term.split_once('*') {
                Some((lhs, rhs)) => {
                    if let Ok(v) = lhs.parse::<f64>() {
                        (v, rhs)
                    } else if let Ok(v) = rhs.parse::<f64>() {
                        (v, lhs)
                    } else {
                        return Err(malformed(&term));
                    }
                },
                None => (1.0, term.as_str())
            };
            if group.is_empty() || group.parse::<f64>().is_ok() || group.contains('*') {
                return Err(malformed(&term));
            }
            coefficients.push((group.to_string(), sign * coef));
        }

        Self::new(name, coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairwise() {
        let contrast: Contrast = "mut - wt".parse().unwrap();
        assert_eq!(contrast.name(), "mut-wt");
        assert_eq!(contrast.coefficients().get("mut"), Some(&1.0));
        assert_eq!(contrast.coefficients().get("wt"), Some(&-1.0));
        assert_eq!(contrast, Contrast::pairwise("mut", "wt").unwrap());
    }

    #[test]
    fn test_all_pairwise() {
        let groups: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let names: Vec<String> = Contrast::all_pairwise(&groups).unwrap().iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["a-b", "a-c", "b-c"]);
        assert!(Contrast::all_pairwise(&groups[..1]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_named_weighted() {
        let contrast: Contrast = "avg=a - 0.5*b - c*0.5".parse().unwrap();
        assert_eq!(contrast.name(), "avg");
        assert_eq!(contrast.coefficients().len(), 3);
        assert_eq!(contrast.coefficients().get("b"), Some(&-0.5));
        assert_eq!(contrast.coefficients().get("c"), Some(&-0.5));

        let contrast: Contrast = "2*a-b".parse().unwrap();
        assert_eq!(contrast.name(), "2*a-b");
        assert_eq!(contrast.coefficients().get("a"), Some(&2.0));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Contrast>().unwrap_err(), ContrastError::Empty);
        assert_eq!(
            "a".parse::<Contrast>().unwrap_err(),
            ContrastError::TooFewGroups { contrast: "a".to_string(), found: 1 }
        );
        // cancels out to a single group
        assert_eq!(
            "x=a-b+b".parse::<Contrast>().unwrap_err(),
            ContrastError::TooFewGroups { contrast: "x".to_string(), found: 1 }
        );
        assert!(matches!("a-".parse::<Contrast>(), Err(ContrastError::MalformedTerm { .. })));
        assert!(matches!("a+-b".parse::<Contrast>(), Err(ContrastError::MalformedTerm { .. })));
        assert!(matches!("x*y-b".parse::<Contrast>(), Err(ContrastError::MalformedTerm { .. })));
        assert!(matches!("a-2".parse::<Contrast>(), Err(ContrastError::MalformedTerm { .. })));
    }
}
