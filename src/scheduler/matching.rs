//! Couplage biparti maximal (créneaux à gauche, workers à droite).

/// Primitive de couplage utilisée par le matcher week-end.
///
/// `edges[l]` liste les sommets droits admissibles pour `l`, dans l'ordre de
/// préférence. `matching[l]` contient l'état initial et est étendu sur place :
/// un sommet gauche déjà couplé le reste.
pub trait BipartiteMatcher {
    fn extend(&self, edges: &[Vec<usize>], right_len: usize, matching: &mut [Option<usize>]);
}

/// Chemins augmentants (Kuhn), largement suffisant pour quelques centaines
/// de sommets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AugmentingPath;

impl BipartiteMatcher for AugmentingPath {
    fn extend(&self, edges: &[Vec<usize>], right_len: usize, matching: &mut [Option<usize>]) {
        let mut owner: Vec<Option<usize>> = vec![None; right_len];
        for (left, right) in matching.iter().enumerate() {
            if let Some(r) = right {
                owner[*r] = Some(left);
            }
        }

        for left in 0..edges.len() {
            if matching[left].is_some() {
                continue;
            }
            let mut visited = vec![false; right_len];
            augment(left, edges, &mut owner, &mut visited);
        }

        for m in matching.iter_mut() {
            *m = None;
        }
        for (right, left) in owner.iter().enumerate() {
            if let Some(l) = left {
                matching[*l] = Some(right);
            }
        }
    }
}

fn augment(
    left: usize,
    edges: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &right in &edges[left] {
        if visited[right] {
            continue;
        }
        visited[right] = true;
        let free = match owner[right] {
            None => true,
            Some(other) => augment(other, edges, owner, visited),
        };
        if free {
            owner[right] = Some(left);
            return true;
        }
    }
    false
}
