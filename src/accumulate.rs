//! Resultaataccumulator: celgrenzen per taakas en zijde, in bezoekvolgorde.
//!
//! Een renderer of exporteur leest de stroken per [`ExtentTag`] uit; de
//! accumulator zelf doet niets met de waarden behalve ze bewaren.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::interval::Interval;

/// Onder- of bovengrens van een celinterval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lower,
    Upper,
}

/// Sleutel voor één strook grenswaarden: taakas plus zijde.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentTag {
    pub axis: usize,
    pub side: Side,
}

impl ExtentTag {
    /// Canonieke naam: `xleft`/`xright`/`yleft`/`yright` voor de eerste twee
    /// assen, daarboven `a{i}left`/`a{i}right`.
    #[must_use]
    pub fn name(&self) -> String {
        let side = match self.side {
            Side::Lower => "left",
            Side::Upper => "right",
        };
        match self.axis {
            0 => format!("x{side}"),
            1 => format!("y{side}"),
            axis => format!("a{axis}{side}"),
        }
    }

    fn lane(&self) -> usize {
        2 * self.axis
            + match self.side {
                Side::Lower => 0,
                Side::Upper => 1,
            }
    }
}

/// Alleen-toevoegen verzameling celgrenzen; invoegvolgorde is bezoekvolgorde.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPoints {
    task_dim: usize,
    lanes: Vec<Vec<f64>>,
}

impl BoxPoints {
    #[must_use]
    pub fn new(task_dim: usize) -> Self {
        Self {
            task_dim,
            lanes: vec![Vec::new(); 2 * task_dim],
        }
    }

    #[must_use]
    pub const fn task_dim(&self) -> usize {
        self.task_dim
    }

    /// Registreert de grenzen van één cel.
    pub fn push_cell(&mut self, cell: &[Interval]) {
        debug_assert_eq!(cell.len(), self.task_dim);
        for (axis, interval) in cell.iter().enumerate() {
            self.lanes[2 * axis].push(interval.lo());
            self.lanes[2 * axis + 1].push(interval.hi());
        }
    }

    /// Aantal geregistreerde cellen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strook grenswaarden voor één tag.
    #[must_use]
    pub fn extents(&self, tag: ExtentTag) -> &[f64] {
        &self.lanes[tag.lane()]
    }

    /// Plakt een andere accumulator achter deze aan, met behoud van volgorde.
    pub fn merge(&mut self, other: Self) {
        debug_assert_eq!(self.task_dim, other.task_dim);
        for (lane, extra) in self.lanes.iter_mut().zip(other.lanes) {
            lane.extend(extra);
        }
    }

    fn tags(&self) -> impl Iterator<Item = ExtentTag> + '_ {
        (0..self.task_dim).flat_map(|axis| {
            [
                ExtentTag {
                    axis,
                    side: Side::Lower,
                },
                ExtentTag {
                    axis,
                    side: Side::Upper,
                },
            ]
        })
    }
}

// Geserialiseerd als map van tagnaam naar strook, zodat de export leesbare
// sleutels heeft in plaats van laneposities.
impl Serialize for BoxPoints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.lanes.len()))?;
        for tag in self.tags() {
            map.serialize_entry(&tag.name(), self.extents(tag))?;
        }
        map.end()
    }
}
