/// Half-open pixel rectangle `[xmin, xmax) x [ymin, ymax)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub xmin: usize,
    pub ymin: usize,
    pub xmax: usize,
    pub ymax: usize,
}

impl Tile {
    pub fn width(&self) -> usize {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> usize {
        self.ymax - self.ymin
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.xmin && x < self.xmax && y >= self.ymin && y < self.ymax
    }
}

/// Row-major tiles of edge `tile_size`; the last column and row are clipped to the frame.
pub fn build_tiles(width: usize, height: usize, tile_size: usize) -> Vec<Tile> {
    if width == 0 || height == 0 || tile_size == 0 {
        return Vec::new();
    }

    let columns = width.div_ceil(tile_size);
    let rows = height.div_ceil(tile_size);
    let mut tiles = Vec::with_capacity(columns * rows);
    for ty in 0..rows {
        let ymin = ty * tile_size;
        let ymax = (ymin + tile_size).min(height);
        for tx in 0..columns {
            let xmin = tx * tile_size;
            tiles.push(Tile {
                xmin,
                ymin,
                xmax: (xmin + tile_size).min(width),
                ymax,
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(width: usize, height: usize, tile_size: usize) {
        let tiles = build_tiles(width, height, tile_size);
        assert_eq!(
            tiles.len(),
            width.div_ceil(tile_size) * height.div_ceil(tile_size),
            "{width}x{height} / {tile_size}"
        );

        let mut coverage = vec![0u8; width * height];
        for tile in &tiles {
            assert!(tile.width() > 0 && tile.height() > 0);
            assert!(tile.width() <= tile_size && tile.height() <= tile_size);
            for y in tile.ymin..tile.ymax {
                for x in tile.xmin..tile.xmax {
                    coverage[y * width + x] += 1;
                }
            }
        }
        assert!(coverage.iter().all(|&c| c == 1), "{width}x{height} / {tile_size}");
    }

    #[test]
    fn tiles_partition_the_frame() {
        for &(w, h) in &[(64, 64), (65, 33), (1, 1), (31, 97), (128, 64), (7, 300)] {
            for &t in &[1, 7, 16, 32, 64, 500] {
                assert_partition(w, h, t);
            }
        }
    }

    #[test]
    fn tiles_are_row_major() {
        let tiles = build_tiles(70, 40, 32);
        let origins: Vec<(usize, usize)> = tiles.iter().map(|t| (t.xmin, t.ymin)).collect();
        assert_eq!(
            origins,
            vec![(0, 0), (32, 0), (64, 0), (0, 32), (32, 32), (64, 32)]
        );
        assert_eq!(tiles[2].width(), 6);
        assert_eq!(tiles[5].height(), 8);
    }

    #[test]
    fn empty_frame_has_no_tiles() {
        assert!(build_tiles(0, 64, 32).is_empty());
        assert!(build_tiles(64, 0, 32).is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let tile = Tile {
            xmin: 0,
            ymin: 0,
            xmax: 4,
            ymax: 4,
        };
        assert!(tile.contains(3, 3));
        assert!(!tile.contains(4, 0));
        assert_eq!(tile.pixel_count(), 16);
    }
}
