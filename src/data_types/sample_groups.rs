
use indexmap::IndexMap;
use rustc_hash::FxHashMap as HashMap;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SampleGroupError {
    #[error("group name cannot be empty")]
    EmptyGroupName,
    #[error("group {group} has no samples")]
    EmptyGroup { group: String },
    #[error("sample {sample} is assigned more than once (groups {first} and {second})")]
    DuplicateSample { sample: String, first: String, second: String }
}

/// A partition of sample identifiers into named groups.
/// Group order is preserved and drives the order of every per-group output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleGroups {
    /// Group name to member sample identifiers
    groups: IndexMap<String, Vec<String>>
}

impl SampleGroups {
    /// Builds the partition from (group, samples) pairs.
    /// Pairs sharing a group name are concatenated.
    /// # Errors
    /// * if a group name is empty or a group ends up with no samples
    /// * if a sample is listed twice, in the same or in different groups
    pub fn new<G, S, I>(entries: I) -> Result<Self, SampleGroupError>
    where
        G: Into<String>,
        S: Into<String>,
        I: IntoIterator<Item = (G, Vec<S>)>
    {
        let mut groups: IndexMap<String, Vec<String>> = Default::default();
        let mut owner: HashMap<String, String> = Default::default();
        for (group, samples) in entries.into_iter() {
            let group: String = group.into();
            if group.is_empty() {
                return Err(SampleGroupError::EmptyGroupName);
            }

            let members = groups.entry(group.clone()).or_default();
            for sample in samples.into_iter() {
                let sample: String = sample.into();
                if let Some(first) = owner.get(&sample) {
                    return Err(SampleGroupError::DuplicateSample {
                        sample, first: first.clone(), second: group
                    });
                }
                owner.insert(sample.clone(), group.clone());
                members.push(sample);
            }
        }

        if let Some((group, _)) = groups.iter().find(|(_, samples)| samples.is_empty()) {
            return Err(SampleGroupError::EmptyGroup { group: group.clone() });
        }

        Ok(Self { groups })
    }

    /// Returns the samples for a group
    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(|v| v.as_slice())
    }

    /// Iterates over (group, samples) in group order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.groups.iter()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
