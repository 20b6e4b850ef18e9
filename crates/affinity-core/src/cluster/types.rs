use crate::error::ClusterError;
use crate::ratings::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cluster identifier, allocated by the [`ClusterStore`](super::ClusterStore)
/// in creation order.
///
/// Ids are per-store (not process-global), so replaying the same assignment
/// sequence into an empty store yields the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a ClusterId from a raw u64 value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group of users with similar rating vectors.
///
/// `weights` is the cluster prototype; `members` maps each member to the
/// vector it had when it joined (or was last refreshed). Every member vector
/// has the dimensionality of `weights`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    id: ClusterId,
    weights: Vec<f64>,
    members: BTreeMap<UserId, Vec<f64>>,
}

impl Cluster {
    /// New cluster with a single member whose vector is the initial prototype.
    pub fn new(id: ClusterId, weights: Vec<f64>, member: UserId, vector: Vec<f64>) -> Self {
        let mut members = BTreeMap::new();
        members.insert(member, vector);
        Self {
            id,
            weights,
            members,
        }
    }

    /// Reassembles a cluster from persisted parts.
    pub fn from_parts(id: ClusterId, weights: Vec<f64>, members: BTreeMap<UserId, Vec<f64>>) -> Self {
        Self {
            id,
            weights,
            members,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// Prototype vector.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn members(&self) -> &BTreeMap<UserId, Vec<f64>> {
        &self.members
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.members.contains_key(&user_id)
    }

    pub fn member_vector(&self, user_id: UserId) -> Option<&[f64]> {
        self.members.get(&user_id).map(Vec::as_slice)
    }

    /// Dimensionality of the prototype.
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Inserts or replaces a member's vector.
    pub fn insert_member(&mut self, user_id: UserId, vector: Vec<f64>) {
        debug_assert_eq!(vector.len(), self.weights.len());
        self.members.insert(user_id, vector);
    }

    /// Moves the prototype toward `input` by `learning_rate`:
    /// `w[i] += α·(v[i] − w[i])`.
    pub fn adapt_toward(&mut self, input: &[f64], learning_rate: f64) {
        debug_assert_eq!(input.len(), self.weights.len());
        for (weight, &value) in self.weights.iter_mut().zip(input) {
            *weight += learning_rate * (value - *weight);
        }
    }

    /// Zero-pads the prototype and every member vector up to `dim` slots.
    ///
    /// Used when the store's item axis grew since the cluster was last
    /// touched; the axis only appends, so new items occupy trailing slots.
    pub fn grow_to(&mut self, dim: usize) {
        if dim <= self.weights.len() {
            return;
        }
        self.weights.resize(dim, 0.0);
        for vector in self.members.values_mut() {
            vector.resize(dim, 0.0);
        }
    }
}

/// Resonance threshold in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Vigilance(f64);

impl Vigilance {
    /// Validates and wraps a vigilance value.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` for values outside [0, 1]
    /// (including NaN).
    pub fn new(value: f64) -> Result<Self, ClusterError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ClusterError::InvalidParameter(format!(
                "vigilance must be in [0, 1], got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// The resonance test: `similarity >= ρ`.
    pub fn resonates(&self, similarity: f64) -> bool {
        similarity >= self.0
    }
}

/// Outcome of assigning a user vector to a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assignment {
    /// No cluster resonated; a new one was created around the vector
    Created(ClusterId),
    /// The first resonating cluster took the user and adapted its prototype
    Joined {
        cluster_id: ClusterId,
        similarity: f64,
    },
    /// The user was already a member; its stored vector was refreshed
    Refreshed(ClusterId),
}

impl Assignment {
    pub fn cluster_id(&self) -> ClusterId {
        match self {
            Assignment::Created(id) | Assignment::Refreshed(id) => *id,
            Assignment::Joined { cluster_id, .. } => *cluster_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64) -> UserId {
        UserId::from_u64(id)
    }

    #[test]
    fn test_new_cluster_has_single_member() {
        let cluster = Cluster::new(ClusterId::from_u64(0), vec![5.0, 3.0], user(1), vec![5.0, 3.0]);
        assert_eq!(cluster.len(), 1);
        assert!(cluster.contains(user(1)));
        assert_eq!(cluster.member_vector(user(1)), Some(&[5.0, 3.0][..]));
        assert_eq!(cluster.dim(), 2);
    }

    #[test]
    fn test_adapt_toward_half_step() {
        let mut cluster = Cluster::new(ClusterId::from_u64(0), vec![5.0, 3.0], user(1), vec![5.0, 3.0]);
        cluster.adapt_toward(&[5.0, 3.2], 0.5);
        assert!((cluster.weights()[0] - 5.0).abs() < 1e-12);
        assert!((cluster.weights()[1] - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_adapt_toward_full_rate_copies_input() {
        let mut cluster = Cluster::new(ClusterId::from_u64(0), vec![1.0, 1.0], user(1), vec![1.0, 1.0]);
        cluster.adapt_toward(&[4.0, 0.0], 1.0);
        assert_eq!(cluster.weights(), &[4.0, 0.0]);
    }

    #[test]
    fn test_grow_to_pads_weights_and_members() {
        let mut cluster = Cluster::new(ClusterId::from_u64(0), vec![1.0], user(1), vec![1.0]);
        cluster.insert_member(user(2), vec![2.0]);
        cluster.grow_to(3);

        assert_eq!(cluster.weights(), &[1.0, 0.0, 0.0]);
        assert_eq!(cluster.member_vector(user(2)), Some(&[2.0, 0.0, 0.0][..]));

        // Shrinking is a no-op
        cluster.grow_to(1);
        assert_eq!(cluster.dim(), 3);
    }

    #[test]
    fn test_vigilance_bounds() {
        assert!(Vigilance::new(0.0).is_ok());
        assert!(Vigilance::new(1.0).is_ok());
        assert!(Vigilance::new(-0.1).is_err());
        assert!(Vigilance::new(1.1).is_err());
        assert!(Vigilance::new(f64::NAN).is_err());
    }

    #[test]
    fn test_resonance_is_inclusive() {
        let rho = Vigilance::new(0.9).unwrap();
        assert!(rho.resonates(0.9));
        assert!(rho.resonates(0.95));
        assert!(!rho.resonates(0.8999));
    }

    #[test]
    fn test_assignment_cluster_id() {
        let id = ClusterId::from_u64(4);
        assert_eq!(Assignment::Created(id).cluster_id(), id);
        assert_eq!(Assignment::Refreshed(id).cluster_id(), id);
        assert_eq!(
            Assignment::Joined {
                cluster_id: id,
                similarity: 0.99
            }
            .cluster_id(),
            id
        );
    }
}
