//! Python extension module: a table of four heuristic seats.

use crate::config::SessionConfig;
use crate::session::Session;
use crate::tiles::KIND_COUNT;
use numpy::{IntoPyArray, PyArray1};
use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

#[pyclass(unsendable)]
pub struct Table {
    session: Session,
}

#[pymethods]
impl Table {
    /// `dealer=None` rolls the dice for the dealer.
    #[new]
    #[pyo3(signature = (dealer=None))]
    fn new(dealer: Option<usize>) -> PyResult<Self> {
        let config = SessionConfig { dealer, ..Default::default() };
        let session = Session::new(&config).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { session })
    }

    /// Plays the game out. Returns `(won, seat)`.
    fn run(&mut self) -> PyResult<(bool, usize)> {
        let outcome = self.session.run().map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok((outcome.won, outcome.seat))
    }

    /// Per-kind counts of a seat's concealed tiles, indexed by flat tile kind.
    fn concealed_counts<'py>(
        &self,
        py: Python<'py>,
        seat: usize,
    ) -> PyResult<Bound<'py, PyArray1<u8>>> {
        let hand = self
            .session
            .game()
            .hands()
            .get(seat)
            .ok_or_else(|| PyIndexError::new_err("seat must be 0, 1, 2 or 3"))?;
        let mut counts = vec![0u8; KIND_COUNT];
        for t in hand.concealed() {
            counts[t.kind().index() as usize] += 1;
        }
        Ok(counts.into_pyarray_bound(py))
    }

    fn remaining(&self) -> usize {
        self.session.game().wall().remaining()
    }

    fn dealer(&self) -> usize {
        self.session.game().dealer()
    }
}

#[pymodule]
fn mahjong_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Table>()?;
    Ok(())
}
