use ndarray::Ix;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

type Coord = usize;

/// A location `(r, c)` on a board. `Location(0, 0)` is the top left corner.
#[derive(Clone, Eq, Hash, Copy, PartialEq, Ord, PartialOrd, Debug)]
pub struct Location(pub Coord, pub Coord);

impl Location {
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.0, self.1)
    }

    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self(self.0.wrapping_add_signed(rhs.0), self.1.wrapping_add_signed(rhs.1))
    }
}

impl From<(Ix, Ix)> for Location {
    fn from(value: (Ix, Ix)) -> Self {
        Self(value.0, value.1)
    }
}

// Hosts address cells as `{r, c}` objects, so locations cross the wire in
// that shape rather than as a tuple.
#[derive(Serialize, Deserialize)]
struct LocationRepr {
    r: Coord,
    c: Coord,
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LocationRepr { r: self.0, c: self.1 }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = LocationRepr::deserialize(deserializer)?;
        Ok(Self(repr.r, repr.c))
    }
}
