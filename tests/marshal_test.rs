//! Typed reads and writes through the layout cache

mod common;

use common::{module_snapshot, MODULE_BASE};
use memscan::marshal::{self, FieldReader, FieldWriter, NumericKind};
use memscan::{layout_of, Address, Marshal, MemoryAccessor, MemorySnapshot, TypeDescriptor};
use pretty_assertions::assert_eq;

memscan::marshal_enum! {
    pub enum WeaponSlot: u32 {
        Primary = 1,
        Secondary = 2,
        Melee = 3,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entity {
    position: [f32; 3],
    health: i32,
    slot: WeaponSlot,
    owner: Address,
    tag: String,
}

impl Marshal for Entity {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::structure()
            .fixed_buffer::<f32>("position", 3)
            .field::<i32>("health")
            .field::<WeaponSlot>("slot")
            .field::<Address>("owner")
            .marshaled("tag", TypeDescriptor::fixed_buffer(u8::descriptor(), 8))
            .build()
    }

    fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self> {
        Some(Entity {
            position: reader.read()?,
            health: reader.read()?,
            slot: reader.read()?,
            owner: reader.read()?,
            tag: reader.read_fixed_string(8)?,
        })
    }

    fn marshal(&self, writer: &mut FieldWriter) {
        writer.write(&self.position);
        writer.write(&self.health);
        writer.write(&self.slot);
        writer.write(&self.owner);
        writer.write_fixed_string(&self.tag, 8);
    }

    fn zeroed() -> Self {
        Entity {
            position: [0.0; 3],
            health: 0,
            slot: WeaponSlot::zeroed(),
            owner: Address::null(),
            tag: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Vec2 {
    x: u32,
    y: u32,
}

memscan::marshal_pod!(Vec2 { x: u32, y: u32 });

fn accessor() -> MemoryAccessor<MemorySnapshot> {
    MemoryAccessor::new(module_snapshot(&[0u8; 0x1000])).unwrap()
}

fn round_trip<T>(accessor: &MemoryAccessor<MemorySnapshot>, value: T)
where
    T: Marshal + PartialEq + std::fmt::Debug,
{
    let address = MODULE_BASE.add_bytes(0x100);
    accessor.write_value(address, &value).unwrap();
    assert_eq!(accessor.read_value::<T>(address).unwrap(), value);
}

#[test]
fn test_primitive_round_trips() {
    let accessor = accessor();
    round_trip(&accessor, 0xABu8);
    round_trip(&accessor, -5i8);
    round_trip(&accessor, 0xBEEFu16);
    round_trip(&accessor, -30_000i16);
    round_trip(&accessor, 0xDEAD_BEEFu32);
    round_trip(&accessor, i32::MIN);
    round_trip(&accessor, u64::MAX - 1);
    round_trip(&accessor, -1i64);
    round_trip(&accessor, 1.5f32);
    round_trip(&accessor, -2.25f64);
    round_trip(&accessor, true);
    round_trip(&accessor, Address::new(0x7FF6_1234_5678));
    round_trip(&accessor, [1u16, 2, 3, 4]);
}

#[test]
fn test_primitives_use_raw_copy() {
    for layout in [
        layout_of::<u8>(),
        layout_of::<i64>(),
        layout_of::<f32>(),
        layout_of::<Address>(),
    ] {
        assert!(!layout.requires_marshal);
    }
    assert_eq!(layout_of::<Address>().kind, NumericKind::Pointer);
    assert_eq!(layout_of::<[f32; 3]>().size, 12);
}

#[test]
fn test_bool_any_nonzero_byte_is_true() {
    let accessor = accessor();
    accessor.write_bytes(MODULE_BASE, &[2]).unwrap();
    assert!(accessor.read_value::<bool>(MODULE_BASE).unwrap());
    accessor.write_bytes(MODULE_BASE, &[0]).unwrap();
    assert!(!accessor.read_value::<bool>(MODULE_BASE).unwrap());
}

#[test]
fn test_enum_values() {
    let accessor = accessor();
    round_trip(&accessor, WeaponSlot::Melee);
    assert_eq!(layout_of::<WeaponSlot>().kind, NumericKind::U32);

    // Unknown discriminant decodes to the zero value
    accessor.write_value(MODULE_BASE, &99u32).unwrap();
    assert_eq!(
        accessor.read_value::<WeaponSlot>(MODULE_BASE).unwrap(),
        WeaponSlot::Primary
    );
}

#[test]
fn test_struct_round_trip() {
    let accessor = accessor();
    let entity = Entity {
        position: [1.0, -2.0, 3.5],
        health: 100,
        slot: WeaponSlot::Secondary,
        owner: Address::new(0x1234),
        tag: "npc_01".to_string(),
    };
    round_trip(&accessor, entity.clone());

    let layout = layout_of::<Entity>();
    assert!(layout.requires_marshal);
    assert_eq!(
        layout.size,
        12 + 4 + 4 + std::mem::size_of::<usize>() + 8
    );
    assert_eq!(marshal::encode(&entity).len(), layout.size);
}

#[test]
fn test_struct_tag_is_truncated() {
    let accessor = accessor();
    let entity = Entity {
        tag: "a_very_long_tag".to_string(),
        ..Entity::zeroed()
    };
    accessor.write_value(MODULE_BASE, &entity).unwrap();
    assert_eq!(accessor.read_value::<Entity>(MODULE_BASE).unwrap().tag, "a_very_");
}

#[test]
fn test_pod_struct_reads_by_raw_copy() {
    let accessor = accessor();
    round_trip(&accessor, Vec2 { x: 10, y: 20 });
    round_trip(
        &accessor,
        [Vec2 { x: 1, y: 2 }, Vec2 { x: 3, y: 4 }, Vec2 { x: 5, y: 6 }],
    );

    let layout = layout_of::<Vec2>();
    assert_eq!(layout.size, 8);
    assert!(!layout.requires_marshal);
    assert!(!layout_of::<[Vec2; 3]>().requires_marshal);

    accessor.write_bytes(MODULE_BASE, &[7, 0, 0, 0, 9, 0, 0, 0]).unwrap();
    assert_eq!(
        accessor.read_value::<Vec2>(MODULE_BASE).unwrap(),
        Vec2 { x: 7, y: 9 }
    );
}

#[test]
fn test_large_byte_array_round_trip() {
    let accessor = accessor();
    let mut page = [0u8; 0x400];
    for (index, byte) in page.iter_mut().enumerate() {
        *byte = (index % 256) as u8;
    }
    accessor.write_value(MODULE_BASE, &page).unwrap();
    assert_eq!(accessor.read_value::<[u8; 0x400]>(MODULE_BASE).unwrap(), page);
}

#[test]
fn test_layouts_are_cached_once() {
    let first = layout_of::<Entity>();
    let second = layout_of::<Entity>();
    assert_eq!(first, second);
    assert!(marshal::cached_layouts() >= 1);
}

#[test]
fn test_layout_cache_is_shared_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(layout_of::<[u64; 16]>))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().size, 128);
    }
}
