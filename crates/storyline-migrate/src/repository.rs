//! The ordered collection of migration steps. A repository is constructed
//! explicitly and validated up front; there is no process-global cached
//! instance.

use storyline_common::{Error, Result};

use crate::op::{Direction, Transformation};

/// One version-to-version migration unit. Shipped steps are immutable
/// history: new schema changes are only ever additive new steps.
#[derive(Debug, Clone)]
pub struct Step {
    pub version: u32,
    pub name: &'static str,
    pub upgrade: Transformation,
    pub downgrade: Transformation,
}

impl Step {
    pub fn new(
        version: u32,
        name: &'static str,
        upgrade: Transformation,
        downgrade: Transformation,
    ) -> Self {
        Self {
            version,
            name,
            upgrade,
            downgrade,
        }
    }
}

/// An ordered step set addressed by contiguous versions `1..=N`.
#[derive(Debug, Clone)]
pub struct Repository {
    steps: Vec<Step>,
}

impl Repository {
    /// Validate and take ownership of a step set. Versions must run
    /// contiguously from 1.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::PathNotFound("no migration steps registered".into()));
        }
        for (idx, step) in steps.iter().enumerate() {
            let expected = idx as u32 + 1;
            if step.version != expected {
                return Err(Error::PathNotFound(format!(
                    "step versions must run contiguously from 1: expected {expected}, found {}",
                    step.version
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn latest(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn step(&self, version: u32) -> Option<&Step> {
        if version == 0 {
            return None;
        }
        self.steps.get(version as usize - 1)
    }

    /// The ordered steps between two versions, each paired with the
    /// direction to apply it in. Empty when `from == to`.
    pub fn path(&self, from: u32, to: u32) -> Result<Vec<(&Step, Direction)>> {
        let latest = self.latest();
        for version in [from, to] {
            if version > latest {
                return Err(Error::InvalidVersion {
                    requested: version as i64,
                    latest,
                });
            }
        }

        let mut path = Vec::new();
        if to > from {
            for version in from + 1..=to {
                path.push((self.step(version).unwrap(), Direction::Up));
            }
        } else {
            for version in (to + 1..=from).rev() {
                path.push((self.step(version).unwrap(), Direction::Down));
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Transformation;

    fn step(version: u32) -> Step {
        Step::new(
            version,
            "test step",
            Transformation::new(vec![]),
            Transformation::new(vec![]),
        )
    }

    fn repo(n: u32) -> Repository {
        Repository::new((1..=n).map(step).collect()).unwrap()
    }

    #[test]
    fn empty_step_set_is_rejected() {
        let err = Repository::new(vec![]).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn non_contiguous_versions_are_rejected() {
        let err = Repository::new(vec![step(1), step(3)]).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));

        let err = Repository::new(vec![step(0)]).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn path_upgrades_in_ascending_order() {
        let repo = repo(4);
        let path = repo.path(1, 3).unwrap();
        let versions: Vec<(u32, Direction)> =
            path.iter().map(|(s, d)| (s.version, *d)).collect();
        assert_eq!(versions, vec![(2, Direction::Up), (3, Direction::Up)]);
    }

    #[test]
    fn path_downgrades_in_descending_order() {
        let repo = repo(4);
        let path = repo.path(4, 1).unwrap();
        let versions: Vec<(u32, Direction)> =
            path.iter().map(|(s, d)| (s.version, *d)).collect();
        assert_eq!(
            versions,
            vec![
                (4, Direction::Down),
                (3, Direction::Down),
                (2, Direction::Down)
            ]
        );
    }

    #[test]
    fn path_between_equal_versions_is_empty() {
        let repo = repo(2);
        assert!(repo.path(2, 2).unwrap().is_empty());
        assert!(repo.path(0, 0).unwrap().is_empty());
    }

    #[test]
    fn path_rejects_versions_beyond_latest() {
        let repo = repo(2);
        let err = repo.path(0, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidVersion {
                requested: 3,
                latest: 2
            }
        ));
        assert!(repo.path(5, 1).is_err());
    }

    #[test]
    fn reversed_path_equals_flipped_opposite_path() {
        let repo = repo(5);
        for from in 0..=5u32 {
            for to in 0..=5u32 {
                let forward = repo.path(from, to).unwrap();
                let mut backward = repo.path(to, from).unwrap();
                backward.reverse();
                assert_eq!(forward.len(), backward.len());
                for ((fs, fd), (bs, bd)) in forward.iter().zip(backward.iter()) {
                    assert_eq!(fs.version, bs.version);
                    assert_eq!(*fd, bd.flipped());
                }
            }
        }
    }

    #[test]
    fn step_lookup() {
        let repo = repo(3);
        assert_eq!(repo.step(2).unwrap().version, 2);
        assert!(repo.step(0).is_none());
        assert!(repo.step(4).is_none());
        assert_eq!(repo.latest(), 3);
    }
}
