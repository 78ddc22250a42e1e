//! Grid-shape folding rules (component C3).
//!
//! Each variant maps a possibly out-of-range `(x, y, rotation)` to either
//! `None` (the plane rejects it) or a canonical in-range cell, optionally
//! rotating `rotation` when the shape folds one face onto another. The fold
//! tables for the six non-trivial shapes are ported from the reference
//! implementation's `Topology.cpp`, including its quirk of only adjusting
//! `rotation` when it is nonzero — callers that pass `rotation = 0` to mean
//! "I don't care about rotation" (plain coordinate checks) get it back
//! unfolded, which is what the reference does and what the tests pin down.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Torus,
    CylinderX,
    CylinderY,
    Plane,
    SphereLeft,
    SphereRight,
    ConeLeftTop,
    ConeRightTop,
    ConeLeftBottom,
    ConeRightBottom,
}

impl Topology {
    /// Whether this shape requires `width == height`.
    pub fn requires_square(&self) -> bool {
        !matches!(self, Topology::Torus | Topology::CylinderX | Topology::CylinderY | Topology::Plane)
    }

    /// Map `(x, y, rotation)` into the canonical grid, or reject it.
    pub fn normalize(&self, width: i32, height: i32, x: i32, y: i32, rotation: u8) -> Option<(i32, i32, u8)> {
        debug_assert!(rotation < 8);
        debug_assert!(!self.requires_square() || width == height);

        match self {
            Topology::Torus => Some((x.rem_euclid(width), y.rem_euclid(height), rotation)),
            Topology::CylinderX => {
                if (0..height).contains(&y) {
                    Some((x.rem_euclid(width), y, rotation))
                } else {
                    None
                }
            }
            Topology::CylinderY => {
                if (0..width).contains(&x) {
                    Some((x, y.rem_euclid(height), rotation))
                } else {
                    None
                }
            }
            Topology::Plane => {
                if (0..width).contains(&x) && (0..height).contains(&y) {
                    Some((x, y, rotation))
                } else {
                    None
                }
            }
            Topology::SphereLeft => Some(sphere_left(width, height, x, y, rotation)),
            Topology::SphereRight => Some(sphere_right(width, height, x, y, rotation)),
            Topology::ConeLeftTop => cone_left_top(width, height, x, y, rotation),
            Topology::ConeRightTop => cone_right_top(width, height, x, y, rotation),
            Topology::ConeLeftBottom => cone_left_bottom(width, height, x, y, rotation),
            Topology::ConeRightBottom => cone_right_bottom(width, height, x, y, rotation),
        }
    }
}

fn rotate_if_nonzero(rotation: u8, delta: u8) -> u8 {
    if rotation != 0 {
        (rotation + delta) % 8
    } else {
        rotation
    }
}

fn wrap2(x: i32, y: i32, w: i32, h: i32) -> (i32, i32) {
    (x.rem_euclid(2 * w), y.rem_euclid(2 * h))
}

fn sphere_left(w: i32, h: i32, x: i32, y: i32, rotation: u8) -> (i32, i32, u8) {
    let (mut x, mut y) = wrap2(x, y, w, h);
    let mut rotation = rotation;

    if x < w {
        if y >= h {
            std::mem::swap(&mut x, &mut y);
            x = 2 * w - x - 1;
            rotation = rotate_if_nonzero(rotation, 6);
        }
    } else if y < h {
        std::mem::swap(&mut x, &mut y);
        y = 2 * h - y - 1;
        rotation = rotate_if_nonzero(rotation, 2);
    } else {
        x = 2 * w - x - 1;
        y = 2 * h - y - 1;
        rotation = rotate_if_nonzero(rotation, 4);
    }
    (x, y, rotation)
}

fn sphere_right(w: i32, h: i32, x: i32, y: i32, rotation: u8) -> (i32, i32, u8) {
    let (mut x, mut y) = wrap2(x, y, w, h);
    let mut rotation = rotation;

    if x < w {
        if y >= h {
            std::mem::swap(&mut x, &mut y);
            x -= h;
            y = h - y - 1;
            rotation = rotate_if_nonzero(rotation, 2);
        }
    } else if y < h {
        std::mem::swap(&mut x, &mut y);
        x = w - x - 1;
        y -= w;
        rotation = rotate_if_nonzero(rotation, 6);
    } else {
        x = 2 * w - x - 1;
        y = 2 * h - y - 1;
        rotation = rotate_if_nonzero(rotation, 4);
    }
    (x, y, rotation)
}

fn cone_left_top(w: i32, h: i32, x: i32, y: i32, rotation: u8) -> Option<(i32, i32, u8)> {
    if !(-w..w).contains(&x) || !(-h..h).contains(&y) {
        return None;
    }
    let (mut x, mut y) = (x, y);
    let mut rotation = rotation;

    if x < 0 {
        if y < 0 {
            x = -x - 1;
            y = -y - 1;
            rotation = rotate_if_nonzero(rotation, 4);
        } else {
            std::mem::swap(&mut x, &mut y);
            y = -y - 1;
            rotation = rotate_if_nonzero(rotation, 2);
        }
    } else if y < 0 {
        std::mem::swap(&mut x, &mut y);
        x = -x - 1;
        rotation = rotate_if_nonzero(rotation, 6);
    }
    Some((x, y, rotation))
}

fn cone_right_top(w: i32, h: i32, x: i32, y: i32, rotation: u8) -> Option<(i32, i32, u8)> {
    if !(0..2 * w).contains(&x) || !(-h..h).contains(&y) {
        return None;
    }
    let (mut x, mut y) = (x, y);
    let mut rotation = rotation;

    if x >= w {
        if y < 0 {
            x = 2 * w - x - 1;
            y = -y - 1;
            rotation = rotate_if_nonzero(rotation, 4);
        } else {
            std::mem::swap(&mut x, &mut y);
            x = w - x - 1;
            y -= h;
            rotation = rotate_if_nonzero(rotation, 6);
        }
    } else if y < 0 {
        std::mem::swap(&mut x, &mut y);
        x += w;
        y = w - y - 1;
        rotation = rotate_if_nonzero(rotation, 2);
    }
    Some((x, y, rotation))
}

fn cone_left_bottom(w: i32, h: i32, x: i32, y: i32, rotation: u8) -> Option<(i32, i32, u8)> {
    if !(-w..w).contains(&x) || !(0..2 * h).contains(&y) {
        return None;
    }
    let (mut x, mut y) = (x, y);
    let mut rotation = rotation;

    if x < 0 {
        if y >= h {
            x = -x - 1;
            y = 2 * w - y - 1;
            rotation = rotate_if_nonzero(rotation, 4);
        } else {
            std::mem::swap(&mut x, &mut y);
            x = h - x - 1;
            y += h;
            rotation = rotate_if_nonzero(rotation, 6);
        }
    } else if y >= h {
        std::mem::swap(&mut x, &mut y);
        x -= w;
        y = h - y - 1;
        rotation = rotate_if_nonzero(rotation, 2);
    }
    Some((x, y, rotation))
}

fn cone_right_bottom(w: i32, h: i32, x: i32, y: i32, rotation: u8) -> Option<(i32, i32, u8)> {
    if !(0..2 * w).contains(&x) || !(0..2 * h).contains(&y) {
        return None;
    }
    let (mut x, mut y) = (x, y);
    let mut rotation = rotation;

    if x < w {
        if y >= h {
            std::mem::swap(&mut x, &mut y);
            x = 2 * w - x - 1;
            rotation = rotate_if_nonzero(rotation, 6);
        }
    } else if y < h {
        std::mem::swap(&mut x, &mut y);
        y = 2 * h - y - 1;
        rotation = rotate_if_nonzero(rotation, 2);
    } else {
        x = 2 * w - x - 1;
        y = 2 * h - y - 1;
        rotation = rotate_if_nonzero(rotation, 4);
    }
    Some((x, y, rotation))
}
