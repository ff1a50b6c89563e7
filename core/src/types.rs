/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Two-dimensional coordinates `(x, y)`, where `x` selects the row.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}
