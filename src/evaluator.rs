//! Route cost, load and move-delta evaluation.
//!
//! Routes are slices of customer positions (instance order). The depot is
//! implicit at both ends. Costs are always chained in traversal order, so
//! asymmetric matrices are evaluated exactly.

use crate::matrix::{DistanceMatrix, DEPOT};

#[inline]
fn node(customer: usize) -> usize {
    customer + 1
}

/// Cost of depot → visits… → depot. An empty route costs nothing.
pub fn route_cost(visits: &[usize], matrix: &DistanceMatrix) -> f64 {
    let (Some(&first), Some(&last)) = (visits.first(), visits.last()) else {
        return 0.0;
    };

    let inner: f64 = visits
        .windows(2)
        .map(|pair| matrix.get(node(pair[0]), node(pair[1])))
        .sum();

    matrix.get(DEPOT, node(first)) + inner + matrix.get(node(last), DEPOT)
}

/// Summed demand of `visits`, saturating at `i64::MAX`.
pub fn route_load(visits: &[usize], demands: &[i64]) -> i64 {
    visits
        .iter()
        .fold(0i64, |load, &customer| load.saturating_add(demands[customer]))
}

/// True iff the summed demand of `visits` fits in `capacity`.
pub fn is_feasible(visits: &[usize], capacity: i64, demands: &[i64]) -> bool {
    visits
        .iter()
        .try_fold(0i64, |load, &customer| load.checked_add(demands[customer]))
        .is_some_and(|load| load <= capacity)
}

/// Cost deltas of elementary route edits, without building candidate routes.
#[derive(Debug, Clone, Copy)]
pub struct RouteEvaluator<'a> {
    matrix: &'a DistanceMatrix,
}

impl<'a> RouteEvaluator<'a> {
    pub fn new(matrix: &'a DistanceMatrix) -> Self {
        Self { matrix }
    }

    pub fn cost(&self, visits: &[usize]) -> f64 {
        route_cost(visits, self.matrix)
    }

    #[inline]
    fn before(visits: &[usize], position: usize) -> usize {
        if position == 0 { DEPOT } else { node(visits[position - 1]) }
    }

    #[inline]
    fn after(visits: &[usize], position: usize) -> usize {
        visits.get(position + 1).map_or(DEPOT, |&customer| node(customer))
    }

    /// Added cost of inserting `customer` so it ends up at `position`
    /// (`0..=visits.len()`).
    pub fn insertion_delta(&self, visits: &[usize], position: usize, customer: usize) -> f64 {
        let prev = Self::before(visits, position);
        let next = visits.get(position).map_or(DEPOT, |&c| node(c));
        let c = node(customer);

        self.matrix.get(prev, c) + self.matrix.get(c, next) - self.matrix.get(prev, next)
    }

    /// Cost change of removing the customer at `position`.
    pub fn removal_delta(&self, visits: &[usize], position: usize) -> f64 {
        let prev = Self::before(visits, position);
        let next = Self::after(visits, position);
        let c = node(visits[position]);

        self.matrix.get(prev, next) - self.matrix.get(prev, c) - self.matrix.get(c, next)
    }

    /// Cost change of putting `customer` in place of the one at `position`.
    pub fn replacement_delta(&self, visits: &[usize], position: usize, customer: usize) -> f64 {
        let prev = Self::before(visits, position);
        let next = Self::after(visits, position);
        let old = node(visits[position]);
        let new = node(customer);

        self.matrix.get(prev, new) + self.matrix.get(new, next)
            - self.matrix.get(prev, old)
            - self.matrix.get(old, next)
    }

    /// Cost change of reversing `visits[from..=to]`.
    pub fn two_opt_delta(&self, visits: &[usize], from: usize, to: usize) -> f64 {
        debug_assert!(from < to && to < visits.len());
        self.two_opt_deltas(visits, from)
            .nth(to - from - 1)
            .map_or(0.0, |(_, delta)| delta)
    }

    /// Reversal deltas for every segment starting at `from`, as `(to, delta)`.
    ///
    /// Forward and backward segment costs are accumulated as the segment
    /// grows, so the whole row costs O(n).
    pub fn two_opt_deltas<'v>(
        &self,
        visits: &'v [usize],
        from: usize,
    ) -> impl Iterator<Item = (usize, f64)> + 'v
    where
        'a: 'v,
    {
        let matrix = self.matrix;
        let prev = Self::before(visits, from);
        let head = node(visits[from]);
        let mut forward = 0.0;
        let mut backward = 0.0;

        (from + 1..visits.len()).map(move |to| {
            let a = node(visits[to - 1]);
            let b = node(visits[to]);
            forward += matrix.get(a, b);
            backward += matrix.get(b, a);

            let next = Self::after(visits, to);
            let old = matrix.get(prev, head) + forward + matrix.get(b, next);
            let new = matrix.get(prev, b) + backward + matrix.get(head, next);

            (to, new - old)
        })
    }
}
