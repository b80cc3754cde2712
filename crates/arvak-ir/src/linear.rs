//! Boolean matrices over GF(2) and the linear-function operation.
//!
//! A linear function on n qubits is the reversible map `|x⟩ → |Ax⟩` for an
//! invertible n×n matrix A over GF(2). It is exactly what a CX-only circuit
//! computes: `CX(c, t)` adds row `c` into row `t`.

use ndarray::{Array2, ArrayView2, Axis, concatenate, s};
use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::instruction::InstructionKind;
use crate::gate::StandardGate;

/// Product of two boolean matrices over GF(2).
pub fn binary_matmul(a: ArrayView2<bool>, b: ArrayView2<bool>) -> IrResult<Array2<bool>> {
    if a.ncols() != b.nrows() {
        return Err(invalid(format!(
            "cannot multiply {}x{} by {}x{}",
            a.nrows(),
            a.ncols(),
            b.nrows(),
            b.ncols()
        )));
    }
    Ok(Array2::from_shape_fn((a.nrows(), b.ncols()), |(i, j)| {
        (0..b.nrows()).fold(false, |acc, k| acc ^ (a[[i, k]] & b[[k, j]]))
    }))
}

/// Row-reduce `mat` in place over its first `ncols` columns.
///
/// With `full_elim` the result is in reduced row-echelon form; otherwise rows
/// above each pivot are left untouched. Returns the rank.
pub fn gauss_elimination(mat: &mut Array2<bool>, ncols: usize, full_elim: bool) -> usize {
    let nrows = mat.nrows();
    let ncols = ncols.min(mat.ncols());
    let mut rank = 0;

    for col in 0..ncols {
        if rank == nrows {
            break;
        }
        let Some(pivot) = (rank..nrows).find(|&r| mat[[r, col]]) else {
            continue;
        };
        if pivot != rank {
            for c in 0..mat.ncols() {
                mat.swap([pivot, c], [rank, c]);
            }
        }
        let pivot_row = mat.row(rank).to_owned();
        for (r, mut row) in mat.axis_iter_mut(Axis(0)).enumerate() {
            if r != rank && row[col] && (full_elim || r > rank) {
                row.zip_mut_with(&pivot_row, |x, &y| *x ^= y);
            }
        }
        rank += 1;
    }
    rank
}

/// Rank of a boolean matrix over GF(2).
pub fn rank(mat: ArrayView2<bool>) -> usize {
    let mut m = mat.to_owned();
    let ncols = m.ncols();
    gauss_elimination(&mut m, ncols, false)
}

/// True when `mat` is square and invertible over GF(2).
pub fn is_invertible(mat: ArrayView2<bool>) -> bool {
    mat.nrows() == mat.ncols() && rank(mat) == mat.nrows()
}

/// Inverse of a square boolean matrix over GF(2).
pub fn calc_inverse_matrix(mat: ArrayView2<bool>) -> IrResult<Array2<bool>> {
    let n = mat.nrows();
    if n != mat.ncols() {
        return Err(invalid("matrix to invert is not square".into()));
    }
    let identity = Array2::from_shape_fn((n, n), |(i, j)| i == j);
    let mut augmented = concatenate(Axis(1), &[mat.view(), identity.view()])
        .map_err(|e| invalid(e.to_string()))?;
    if gauss_elimination(&mut augmented, n, true) < n {
        return Err(invalid("matrix is not invertible".into()));
    }
    Ok(augmented.slice(s![.., n..2 * n]).to_owned())
}

fn invalid(reason: String) -> IrError {
    IrError::InvalidOperation {
        name: "linear_function".into(),
        reason,
    }
}

/// An invertible linear map over GF(2) acting on qubit basis states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFunction {
    matrix: Array2<bool>,
}

impl LinearFunction {
    /// Create a linear function, rejecting singular or non-square matrices.
    pub fn new(matrix: Array2<bool>) -> IrResult<Self> {
        if !is_invertible(matrix.view()) {
            return Err(invalid(format!(
                "{}x{} matrix is not an invertible square matrix",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        Ok(Self { matrix })
    }

    /// Extract the linear function computed by a circuit of CX and SWAP gates.
    pub fn from_circuit(circuit: &Circuit) -> IrResult<Self> {
        let n = circuit.num_qubits();
        let mut matrix = Array2::from_shape_fn((n, n), |(i, j)| i == j);
        for inst in circuit.instructions() {
            let q: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
            match &inst.kind {
                InstructionKind::Gate(StandardGate::CX) => {
                    let ctrl_row = matrix.row(q[0]).to_owned();
                    matrix.row_mut(q[1]).zip_mut_with(&ctrl_row, |x, &y| *x ^= y);
                }
                InstructionKind::Gate(StandardGate::Swap) => {
                    for c in 0..n {
                        matrix.swap([q[0], c], [q[1], c]);
                    }
                }
                InstructionKind::Gate(StandardGate::I) | InstructionKind::Barrier => {}
                _ => {
                    return Err(invalid(format!(
                        "instruction '{}' is not linear",
                        inst.name()
                    )));
                }
            }
        }
        Ok(Self { matrix })
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &Array2<bool> {
        &self.matrix
    }

    /// Number of qubits the map acts on.
    pub fn num_qubits(&self) -> usize {
        self.matrix.nrows()
    }

    /// The inverse linear function.
    pub fn inverse(&self) -> IrResult<Self> {
        Ok(Self {
            matrix: calc_inverse_matrix(self.matrix.view())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_inverse_roundtrip() {
        let m = array![[true, true, false], [false, true, true], [false, false, true]];
        let inv = calc_inverse_matrix(m.view()).unwrap();
        let prod = binary_matmul(m.view(), inv.view()).unwrap();
        assert_eq!(prod, Array2::from_shape_fn((3, 3), |(i, j)| i == j));
    }

    #[test]
    fn test_singular_rejected() {
        let m = array![[true, true], [true, true]];
        assert!(!is_invertible(m.view()));
        assert!(LinearFunction::new(m).is_err());
    }

    #[test]
    fn test_from_cx_circuit() {
        let mut circuit = Circuit::with_size("lin", 2, 0);
        circuit
            .cx(crate::QubitId(0), crate::QubitId(1))
            .unwrap();
        let lf = LinearFunction::from_circuit(&circuit).unwrap();
        assert_eq!(lf.matrix(), &array![[true, false], [true, true]]);
    }
}
