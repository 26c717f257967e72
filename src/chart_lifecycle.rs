//! Ownership of the chart instances shown on screen.
//!
//! One primary surface and any number of secondary surfaces (the per-character
//! grid). An instance is always destroyed before its replacement is created.

use crate::series::ChartSpec;
use ratatui::layout::{Position, Rect};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Surface {
    Primary,
    Secondary(usize),
}

/// Where an instance's plot area landed in the last frame, and the x range
/// it maps onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotGeometry {
    pub area: Rect,
    pub x_bounds: [f64; 2],
}

impl PlotGeometry {
    /// Data x for a terminal column inside the plot area.
    pub fn column_to_x(&self, column: u16) -> Option<f64> {
        if column < self.area.x || column >= self.area.right() {
            return None;
        }
        let [lo, hi] = self.x_bounds;
        let span = self.area.width.saturating_sub(1).max(1) as f64;
        let frac = (column - self.area.x) as f64 / span;
        Some(lo + frac * (hi - lo))
    }
}

#[derive(Debug)]
pub struct ChartInstance {
    pub id: u64,
    pub surface: Surface,
    pub spec: ChartSpec,
    pub geometry: Option<PlotGeometry>,
}

#[derive(Debug, Default)]
pub struct ChartLifecycleManager {
    primary: Option<ChartInstance>,
    secondary: BTreeMap<usize, ChartInstance>,
    next_id: u64,
    created: u64,
    destroyed: u64,
}

impl ChartLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&mut self, surface: Surface, spec: ChartSpec) -> ChartInstance {
        self.next_id += 1;
        self.created += 1;
        log::debug!("create chart #{} on {:?}: {}", self.next_id, surface, spec.title);
        ChartInstance {
            id: self.next_id,
            surface,
            spec,
            geometry: None,
        }
    }

    fn destroy(&mut self, instance: ChartInstance) {
        self.destroyed += 1;
        log::debug!("destroy chart #{} on {:?}", instance.id, instance.surface);
    }

    /// Replace the primary chart.
    pub fn render_primary(&mut self, spec: ChartSpec) -> &ChartInstance {
        if let Some(old) = self.primary.take() {
            self.destroy(old);
        }
        let instance = self.create(Surface::Primary, spec);
        self.primary.insert(instance)
    }

    /// Replace the whole secondary grid with one chart per spec.
    pub fn render_secondary(&mut self, specs: Vec<ChartSpec>) {
        self.clear_secondary();
        for (slot, spec) in specs.into_iter().enumerate() {
            let instance = self.create(Surface::Secondary(slot), spec);
            self.secondary.insert(slot, instance);
        }
    }

    pub fn clear_primary(&mut self) {
        if let Some(old) = self.primary.take() {
            self.destroy(old);
        }
    }

    pub fn clear_secondary(&mut self) {
        let old = std::mem::take(&mut self.secondary);
        for (_, instance) in old {
            self.destroy(instance);
        }
    }

    pub fn clear(&mut self) {
        self.clear_primary();
        self.clear_secondary();
    }

    pub fn primary(&self) -> Option<&ChartInstance> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> impl Iterator<Item = &ChartInstance> {
        self.secondary.values()
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.len()
    }

    pub fn get(&self, surface: Surface) -> Option<&ChartInstance> {
        match surface {
            Surface::Primary => self.primary.as_ref(),
            Surface::Secondary(slot) => self.secondary.get(&slot),
        }
    }

    /// Record where `surface` was drawn this frame.
    pub fn set_geometry(&mut self, surface: Surface, geometry: Option<PlotGeometry>) {
        let instance = match surface {
            Surface::Primary => self.primary.as_mut(),
            Surface::Secondary(slot) => self.secondary.get_mut(&slot),
        };
        if let Some(instance) = instance {
            instance.geometry = geometry;
        }
    }

    /// The instance whose plot area contains the given cell.
    pub fn instance_at(&self, column: u16, row: u16) -> Option<&ChartInstance> {
        let pos = Position::new(column, row);
        self.primary
            .iter()
            .chain(self.secondary.values())
            .find(|i| i.geometry.is_some_and(|g| g.area.contains(pos)))
    }

    pub fn live_count(&self) -> usize {
        self.primary.is_some() as usize + self.secondary.len()
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{ChartKind, ChartOptions};

    fn spec(title: &str) -> ChartSpec {
        ChartSpec {
            kind: ChartKind::Line,
            title: title.to_string(),
            x_title: String::new(),
            y_title: String::new(),
            x_labels: vec![],
            series: vec![],
            options: ChartOptions::default(),
        }
    }

    #[test]
    fn test_primary_replaced_not_leaked() {
        let mut mgr = ChartLifecycleManager::new();
        let first = mgr.render_primary(spec("a")).id;
        let second = mgr.render_primary(spec("b")).id;
        assert_ne!(first, second);
        assert_eq!(mgr.live_count(), 1);
        assert_eq!(mgr.created(), 2);
        assert_eq!(mgr.destroyed(), 1);
        assert_eq!(mgr.primary().map(|i| i.spec.title.as_str()), Some("b"));
    }

    #[test]
    fn test_secondary_cleared_before_repopulate() {
        let mut mgr = ChartLifecycleManager::new();
        mgr.render_secondary(vec![spec("1"), spec("2"), spec("3"), spec("4")]);
        assert_eq!(mgr.secondary_count(), 4);
        mgr.render_secondary(vec![spec("1"), spec("2")]);
        assert_eq!(mgr.secondary_count(), 2);
        assert_eq!(mgr.destroyed(), 4);
        assert_eq!(mgr.created() - mgr.destroyed(), mgr.live_count() as u64);
        assert!(mgr.get(Surface::Secondary(2)).is_none());
    }

    #[test]
    fn test_clear() {
        let mut mgr = ChartLifecycleManager::new();
        mgr.render_primary(spec("p"));
        mgr.render_secondary(vec![spec("1"), spec("2")]);
        mgr.clear();
        assert_eq!(mgr.live_count(), 0);
        assert_eq!(mgr.created(), mgr.destroyed());
    }

    #[test]
    fn test_instance_at_uses_geometry() {
        let mut mgr = ChartLifecycleManager::new();
        mgr.render_primary(spec("p"));
        assert!(mgr.instance_at(5, 5).is_none());
        mgr.set_geometry(
            Surface::Primary,
            Some(PlotGeometry {
                area: Rect::new(2, 2, 10, 5),
                x_bounds: [0.0, 9.0],
            }),
        );
        assert!(mgr.instance_at(5, 5).is_some());
        assert!(mgr.instance_at(12, 5).is_none());
    }

    #[test]
    fn test_column_to_x() {
        let geom = PlotGeometry {
            area: Rect::new(10, 0, 11, 5),
            x_bounds: [0.0, 100.0],
        };
        assert_eq!(geom.column_to_x(10), Some(0.0));
        assert_eq!(geom.column_to_x(20), Some(100.0));
        assert_eq!(geom.column_to_x(15), Some(50.0));
        assert_eq!(geom.column_to_x(9), None);
        assert_eq!(geom.column_to_x(21), None);
    }
}
