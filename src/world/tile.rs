use std::collections::BTreeMap;

use glam::Vec3;

use crate::config::TerrainConfig;

/// Grid coordinate of a tile, in tiles along X and Z
pub type TileKey = (i32, i32);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileUpdate {
    pub spawned: Vec<TileKey>,
    pub evicted: Vec<TileKey>,
}

impl TileUpdate {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.evicted.is_empty()
    }
}

/// Square window of ground tiles that follows the player around.
#[derive(Debug, Clone)]
pub struct TileManager {
    tile_size: f32,
    load_distance: i32,
    render_distance: i32,
    cleanup_interval: u64,
    /// Loaded tiles and whether they are drawn
    tiles: BTreeMap<TileKey, bool>,
    current: Option<TileKey>,
    frame_counter: u64,
}

impl TileManager {
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            tile_size: config.tile_size.max(f32::EPSILON),
            load_distance: config.load_distance.max(0),
            render_distance: config.render_distance.clamp(0, config.load_distance.max(0)),
            cleanup_interval: config.cleanup_interval.max(1),
            tiles: BTreeMap::new(),
            current: None,
            frame_counter: 0,
        }
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn tile_at(&self, position: Vec3) -> TileKey {
        (
            (position.x / self.tile_size).round() as i32,
            (position.z / self.tile_size).round() as i32,
        )
    }

    /// World position of the center of a tile
    pub fn tile_origin(&self, key: TileKey) -> Vec3 {
        Vec3::new(key.0 as f32 * self.tile_size, 0.0, key.1 as f32 * self.tile_size)
    }

    fn distance(a: TileKey, b: TileKey) -> i32 {
        (a.0 - b.0).abs().max((a.1 - b.1).abs())
    }

    pub fn update(&mut self, player_position: Vec3) -> TileUpdate {
        let player_tile = self.tile_at(player_position);
        let mut update = TileUpdate::default();

        let crossed = self.current != Some(player_tile);
        if crossed {
            self.current = Some(player_tile);
            for x in (player_tile.0 - self.load_distance)..=(player_tile.0 + self.load_distance) {
                for z in (player_tile.1 - self.load_distance)..=(player_tile.1 + self.load_distance)
                {
                    if !self.tiles.contains_key(&(x, z)) {
                        self.tiles.insert((x, z), false);
                        update.spawned.push((x, z));
                    }
                }
            }
        }

        if self.frame_counter % self.cleanup_interval == 0 {
            let load_distance = self.load_distance;
            self.tiles.retain(|key, _| {
                let keep = Self::distance(*key, player_tile) <= load_distance;
                if !keep {
                    update.evicted.push(*key);
                }
                keep
            });
        }

        // Walking back into loaded tiles spawns nothing but still moves the drawn set
        if crossed || !update.evicted.is_empty() {
            let render_distance = self.render_distance;
            for (key, active) in self.tiles.iter_mut() {
                *active = Self::distance(*key, player_tile) <= render_distance;
            }
        }

        self.frame_counter += 1;
        update
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn active_tiles(&self) -> impl Iterator<Item = TileKey> + '_ {
        self.tiles
            .iter()
            .filter(|(_, active)| **active)
            .map(|(key, _)| *key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manager(cleanup_interval: u64) -> TileManager {
        TileManager::new(&TerrainConfig {
            texture: None,
            tile_size: 10.0,
            load_distance: 3,
            render_distance: 2,
            cleanup_interval,
        })
    }

    #[test]
    fn test_first_update_fills_window() {
        let mut tiles = manager(60);
        let update = tiles.update(Vec3::ZERO);
        assert_eq!(update.spawned.len(), 49);
        assert!(update.evicted.is_empty());
        assert_eq!(tiles.tile_count(), 49);
        assert_eq!(tiles.active_tiles().count(), 25);
        assert!(tiles.active_tiles().all(|(x, z)| x.abs() <= 2 && z.abs() <= 2));
    }

    #[test]
    fn test_moving_inside_a_tile_is_free() {
        let mut tiles = manager(60);
        tiles.update(Vec3::ZERO);
        let update = tiles.update(Vec3::new(4.0, 3.0, -4.0));
        assert!(update.is_empty());
        assert_eq!(tiles.tile_count(), 49);
    }

    #[test]
    fn test_crossing_spawns_one_row() {
        let mut tiles = manager(60);
        tiles.update(Vec3::ZERO);
        let update = tiles.update(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(update.spawned.len(), 7);
        assert!(update.spawned.iter().all(|(x, _)| *x == 4));
        // Eviction waits for the cleanup frame
        assert!(update.evicted.is_empty());
        assert_eq!(tiles.tile_count(), 56);
        assert!(tiles.active_tiles().all(|(x, _)| (-1..=3).contains(&x)));
    }

    #[test]
    fn test_far_tiles_are_evicted_on_cleanup() {
        let mut tiles = manager(1);
        tiles.update(Vec3::ZERO);
        let update = tiles.update(Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(update.spawned.len(), 49);
        assert_eq!(update.evicted.len(), 49);
        assert_eq!(tiles.tile_count(), 49);
        assert!(update.evicted.contains(&(0, 0)));
    }

    #[test]
    fn test_returning_to_loaded_tile_refreshes_drawn_tiles() {
        let mut tiles = manager(60);
        tiles.update(Vec3::ZERO);
        tiles.update(Vec3::new(10.0, 0.0, 0.0));
        assert!(!tiles.active_tiles().any(|key| key == (-2, 0)));

        let update = tiles.update(Vec3::ZERO);
        assert!(update.is_empty());
        assert!(tiles.active_tiles().any(|key| key == (-2, 0)));
        assert!(!tiles.active_tiles().any(|key| key == (3, 0)));
        assert_eq!(tiles.active_tiles().count(), 25);
    }

    #[test]
    fn test_tile_coordinates() {
        let tiles = manager(60);
        assert_eq!(tiles.tile_at(Vec3::new(14.0, 50.0, -16.0)), (1, -2));
        assert_eq!(tiles.tile_origin((1, -2)), Vec3::new(10.0, 0.0, -20.0));
    }
}
