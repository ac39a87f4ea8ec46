use crate::engine::progress::Progress;
use crate::engine::structure::{Structure, Unit, UnitKind};
use crate::engine::task::{Outcome, RuntimeContext, run_chunked};
use serde::Serialize;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Units whose derived data is built between two cancellation checks.
const PRECOMPUTE_CHUNK_SIZE: usize = 16;

/// Builds every lazily derived value of `structure`: per-unit lookups, intra-unit bonds and
/// rings, then the structure lookup and inter-unit bonds. Values already built are reused, so a
/// cancelled run can simply be repeated.
#[instrument(skip_all, name = "precompute", fields(units = structure.unit_count()))]
pub fn precompute<C>(structure: &Structure, ctx: &C) -> Outcome<()>
where
    C: RuntimeContext + ?Sized,
{
    if ctx
        .update(Progress::PhaseStart {
            name: "Derived Data",
        })
        .is_err()
    {
        return Outcome::Cancelled;
    }
    let units = structure.units();
    let outcome = match run_chunked::<_, Infallible, _>(
        ctx,
        units.len(),
        PRECOMPUTE_CHUNK_SIZE,
        |chunk| {
            let chunk = &units[chunk];

            #[cfg(not(feature = "parallel"))]
            let iterator = chunk.iter();

            #[cfg(feature = "parallel")]
            let iterator = chunk.par_iter();

            iterator.for_each(|unit| prepare_unit(unit));
            Ok(())
        },
    ) {
        Ok(outcome) => outcome,
        Err(never) => match never {},
    };
    if outcome.is_cancelled() {
        debug!("Precomputation cancelled.");
        return Outcome::Cancelled;
    }

    structure.lookup3d();
    let inter = structure.inter_unit_bonds();
    let _ = ctx.update(Progress::PhaseFinish);
    info!(inter_unit_bonds = inter.edge_count(), "Derived data ready.");
    Outcome::Completed(())
}

fn prepare_unit(unit: &Arc<Unit>) {
    unit.boundary();
    unit.lookup();
    unit.bonds();
    unit.rings();
}

/// Counts and extents describing a structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureSummary {
    pub models: usize,
    pub units: usize,
    pub atomic_units: usize,
    pub coarse_units: usize,
    pub elements: usize,
    pub symmetry_groups: usize,
    pub operators: Vec<String>,
    pub intra_unit_bonds: usize,
    pub inter_unit_bonds: usize,
    pub rings: usize,
    pub aromatic_rings: usize,
    pub center: [f64; 3],
    pub radius: f64,
}

/// Symmetry copies share bond graphs and rings, but every copy is counted.
#[instrument(skip_all, name = "summarize")]
pub fn summarize(structure: &Structure) -> StructureSummary {
    let units = structure.units();
    let atomic: Vec<&Arc<Unit>> = units.iter().filter(|u| u.is_atomic()).collect();
    let operators: BTreeSet<String> = units
        .iter()
        .map(|u| u.operator().name().to_string())
        .collect();
    let sphere = structure.boundary().sphere;

    StructureSummary {
        models: structure.models().len(),
        units: units.len(),
        atomic_units: atomic.len(),
        coarse_units: units
            .iter()
            .filter(|u| matches!(u.kind(), UnitKind::Spheres | UnitKind::Gaussians))
            .count(),
        elements: structure.element_count(),
        symmetry_groups: structure.symmetry_groups().len(),
        operators: operators.into_iter().collect(),
        intra_unit_bonds: atomic.iter().map(|u| u.bonds().edge_count()).sum(),
        inter_unit_bonds: structure.inter_unit_bonds().edge_count(),
        rings: atomic.iter().map(|u| u.rings().len()).sum(),
        aromatic_rings: atomic.iter().map(|u| u.rings().aromatic_rings().len()).sum(),
        center: [sphere.center.x, sphere.center.y, sphere.center.z],
        radius: sphere.radius,
    }
}

impl fmt::Display for StructureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Models:           {}", self.models)?;
        writeln!(
            f,
            "Units:            {} ({} atomic, {} coarse)",
            self.units, self.atomic_units, self.coarse_units
        )?;
        writeln!(f, "Elements:         {}", self.elements)?;
        writeln!(f, "Symmetry groups:  {}", self.symmetry_groups)?;
        writeln!(f, "Operators:        {}", self.operators.join(", "))?;
        writeln!(
            f,
            "Bonds:            {} intra-unit, {} inter-unit",
            self.intra_unit_bonds, self.inter_unit_bonds
        )?;
        writeln!(
            f,
            "Rings:            {} ({} aromatic)",
            self.rings, self.aromatic_rings
        )?;
        write!(
            f,
            "Bounding sphere:  center ({:.3}, {:.3}, {:.3}), radius {:.3}",
            self.center[0], self.center[1], self.center[2], self.radius
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::task::{CancellationToken, SynchronousContext, TaskContext};
    use crate::test_support;
    use crate::workflows::symmetry::build_assembly;
    use std::sync::Mutex;

    #[test]
    fn precompute_reports_every_unit() {
        let s = test_support::two_chain_structure(1.5);
        let steps = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement { steps: n } = event {
                *steps.lock().unwrap() += n;
            }
        }));
        let ctx = TaskContext::new(&reporter, CancellationToken::new());
        assert_eq!(precompute(&s, &ctx), Outcome::Completed(()));
        drop(ctx);
        drop(reporter);
        assert_eq!(steps.into_inner().unwrap(), 2);
    }

    #[test]
    fn cancelled_precompute_stops_before_structure_data() {
        let s = test_support::two_chain_structure(1.5);
        let reporter = ProgressReporter::new();
        let token = CancellationToken::new();
        token.cancel();
        let ctx = TaskContext::new(&reporter, token);
        assert!(precompute(&s, &ctx).is_cancelled());
        assert_eq!(precompute(&s, &SynchronousContext), Outcome::Completed(()));
    }

    #[test]
    fn cancel_before_start_runs_no_chunks() {
        let s = test_support::two_chain_structure(1.5);
        let steps = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement { steps: n } = event {
                *steps.lock().unwrap() += n;
            }
        }));
        let token = CancellationToken::new();
        token.cancel();
        let ctx = TaskContext::new(&reporter, token);
        assert!(precompute(&s, &ctx).is_cancelled());
        drop(ctx);
        drop(reporter);
        assert_eq!(steps.into_inner().unwrap(), 0);
    }

    #[test]
    fn summary_counts_bonds_and_rings() {
        let s = test_support::two_chain_structure(1.5);
        let summary = summarize(&s);
        assert_eq!(summary.units, 2);
        assert_eq!(summary.elements, 6);
        assert_eq!(summary.intra_unit_bonds, 4);
        assert_eq!(summary.inter_unit_bonds, 1);
        assert_eq!(summary.operators, vec!["1_555".to_string()]);
        assert!((summary.center[0] - 3.75).abs() < 1e-6);

        let benzene = Structure::from_model(test_support::benzene_model(false), Default::default());
        let summary = summarize(&benzene);
        assert_eq!((summary.rings, summary.aromatic_rings), (1, 1));
        assert!(summary.to_string().contains("1 aromatic"));
    }

    #[test]
    fn assembly_summary_counts_symmetry_copies() {
        let s = Arc::new(test_support::structure(&test_support::dimer_assembly_data()));
        let assembly = build_assembly(&s, "1").unwrap();
        let summary = summarize(&assembly);
        assert_eq!(summary.units, 2);
        assert_eq!(summary.symmetry_groups, 1);
        assert_eq!(summary.intra_unit_bonds, 4);
        assert_eq!(summary.operators.len(), 2);
    }
}
