use litematica_store::formats::structure;
use litematica_store::{
    BlockState, PackedArray, Palette, Region, RegionConfig, SchematicError, StaticBlockRegistry,
};
use quartz_nbt::{NbtList, NbtTag};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_block(rng: &mut StdRng) -> BlockState {
    match rng.gen_range(0..6) {
        0 => BlockState::air(),
        1 => BlockState::new("minecraft:stone"),
        2 => BlockState::new("minecraft:glass"),
        3 => BlockState::new("minecraft:oak_log")
            .with_property("axis", ["x", "y", "z"][rng.gen_range(0..3)]),
        4 => BlockState::new(format!("minecraft:wool_{}", rng.gen_range(0..16))),
        _ => BlockState::new("minecraft:lever")
            .with_property("facing", ["north", "south", "east", "west"][rng.gen_range(0..4)])
            .with_property("powered", if rng.gen_bool(0.5) { "true" } else { "false" }),
    }
}

#[test]
fn test_set_then_get_returns_block() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut region = Region::new("random", (5, 4, 6));

    for _ in 0..500 {
        let (x, y, z) = (rng.gen_range(0..5), rng.gen_range(0..4), rng.gen_range(0..6));
        let block = random_block(&mut rng);
        region.set_block(x, y, z, &block).unwrap();
        assert_eq!(region.get_block(x, y, z).unwrap(), block);
    }

    // every voxel resolves through the palette
    for x in 0..5 {
        for y in 0..4 {
            for z in 0..6 {
                let index = region.get_palette_index(x, y, z).unwrap();
                assert!((index as usize) < region.palette_len());
            }
        }
    }
}

#[test]
fn test_two_stone_scenario() {
    let mut region = Region::new("scenario", (2, 2, 2));
    let stone = BlockState::new("minecraft:stone");
    region.set_block(0, 0, 0, &stone).unwrap();
    region.set_block(1, 1, 1, &stone).unwrap();

    assert_eq!(region.palette(), vec![BlockState::air(), stone.clone()]);
    assert_eq!(region.total_blocks(), 2);

    let root = structure::to_nbt(&region).unwrap();
    let blocks = root.get::<_, &NbtList>("blocks").unwrap();
    assert_eq!(blocks.len(), 2);
    for tag in blocks.iter() {
        let NbtTag::Compound(block) = tag else {
            panic!("block is not a compound")
        };
        assert_eq!(block.get::<_, i32>("state").unwrap(), 0);
    }
    let palette = root.get::<_, &NbtList>("palette").unwrap();
    assert_eq!(palette.len(), 1);
}

#[test]
fn test_width_growth_scenario() {
    let mut array = PackedArray::with_bits(1, 40);
    for i in (0..40).step_by(3) {
        array.set(i, 1).unwrap();
    }
    array.set(17, 2).unwrap();

    assert_eq!(array.bits_per_entry(), 2);
    for i in 0..40 {
        let expected = if i == 17 {
            2
        } else if i % 3 == 0 {
            1
        } else {
            0
        };
        assert_eq!(array.get(i).unwrap(), expected, "entry {}", i);
    }
}

#[test]
fn test_packed_array_random_values() {
    let mut rng = StdRng::seed_from_u64(42);
    for bits in [1u32, 3, 5, 7, 11, 13, 17, 31] {
        let len = rng.gen_range(1..300);
        let max = (1u64 << bits) - 1;
        let values: Vec<u32> = (0..len).map(|_| rng.gen_range(0..=max) as u32).collect();

        let mut array = PackedArray::with_bits(bits, len);
        for (i, &v) in values.iter().enumerate() {
            array.set(i, v).unwrap();
        }
        assert_eq!(array.bits_per_entry(), bits);
        assert_eq!(array.iter().collect::<Vec<_>>(), values);
    }
}

#[test]
fn test_growth_preserves_random_values() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut array = PackedArray::new(100);
    let mut shadow = vec![0u32; 100];

    for step in 0..400u32 {
        let i = rng.gen_range(0..100);
        // slowly raise the ceiling, like a growing palette
        let v = rng.gen_range(0..=step / 4);
        array.set(i, v).unwrap();
        shadow[i] = v;
        assert_eq!(array.iter().collect::<Vec<_>>(), shadow);
    }
    array.set(0, 99).unwrap();
    shadow[0] = 99;
    assert_eq!(array.iter().collect::<Vec<_>>(), shadow);
    assert_eq!(array.bits_per_entry(), 7);
}

#[test]
fn test_palette_density_under_random_interns() {
    let mut rng = StdRng::seed_from_u64(11);
    let palette = Palette::new();
    let mut max_seen = 0;
    for _ in 0..300 {
        let block = random_block(&mut rng);
        let index = palette.intern(&block);
        assert!(index <= max_seen + 1);
        max_seen = max_seen.max(index);
        assert_eq!(palette.lookup(index).unwrap(), block);
    }
    assert_eq!(palette.len(), max_seen as usize + 1);
}

#[test]
fn test_range_errors() {
    let mut region = Region::new("r", (2, 3, 4));
    let stone = BlockState::new("minecraft:stone");
    for (x, y, z) in [(-1, 0, 0), (0, -1, 0), (0, 0, -1), (2, 0, 0), (0, 3, 0), (0, 0, 4)] {
        assert!(matches!(
            region.get_block(x, y, z),
            Err(SchematicError::OutOfRange { .. })
        ));
        assert!(matches!(
            region.set_block(x, y, z, &stone),
            Err(SchematicError::OutOfRange { .. })
        ));
    }
    assert_eq!(region.total_blocks(), 0);
    assert_eq!(region.palette_len(), 1);
}

#[test]
fn test_counter_counts_placements() {
    let mut region = Region::new("r", (1, 1, 1));
    let stone = BlockState::new("minecraft:stone");
    let dirt = BlockState::new("minecraft:dirt");

    region.set_block(0, 0, 0, &stone).unwrap();
    region.set_block(0, 0, 0, &dirt).unwrap();
    assert_eq!(region.total_blocks(), 2);
    region.set_block(0, 0, 0, &BlockState::air()).unwrap();
    assert_eq!(region.total_blocks(), 1);
}

#[test]
fn test_change_material_relabels_every_voxel() {
    let mut region = Region::new("r", (3, 3, 3));
    let stone = BlockState::new("minecraft:stone");
    let granite = BlockState::new("minecraft:granite");
    for i in 0..3 {
        region.set_block(i, i, i, &stone).unwrap();
    }
    let words = region.data().to_vec();

    assert!(region.change_material(&stone, &granite));
    assert_eq!(region.data(), words.as_slice());
    for i in 0..3 {
        assert_eq!(region.get_block(i, i, i).unwrap(), granite);
    }
    assert!(!region.contains_block_state(&stone));
    assert!(region.contains_block_state(&granite));
}

#[test]
fn test_set_block_by_name_uses_registry_defaults() {
    let registry = StaticBlockRegistry::default();
    let mut region = Region::new("r", (2, 1, 1));

    region.set_block_by_name(0, 0, 0, "oak_log", &registry).unwrap();
    assert_eq!(
        region.get_block(0, 0, 0).unwrap(),
        BlockState::new("minecraft:oak_log").with_property("axis", "y")
    );
    assert!(matches!(
        region.set_block_by_name(1, 0, 0, "minecraft:unobtainium", &registry),
        Err(SchematicError::UnknownBlock(_))
    ));
}

#[test]
fn test_config_defaults_flow_into_region() {
    let config = RegionConfig::from_json(r#"{"author": "mapper", "minecraft_data_version": 3465}"#)
        .unwrap();
    let region = Region::with_config("configured", (1, 1, 1), &config);
    assert_eq!(region.author(), "mapper");
    assert_eq!(region.minecraft_data_version(), 3465);
    assert_eq!(region.version(), 6);
    assert_eq!(region.description(), "");
}
