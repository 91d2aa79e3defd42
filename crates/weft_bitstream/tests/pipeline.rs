//! End-to-end checks of the allocator, encoder and feature-table builder
//! against the routing graph and frame images.

use std::collections::{BTreeMap, BTreeSet};
use weft_arch::{Bel, Fabric, FanInMap, Port, RoutingGraph, Tile, NULL_PORT};
use weft_bitstream::{
    allocate, assemble, compile_fabric, compile_tile, fasm, parse_fasm, BitValue, BitstreamSpec,
    ConfigImage, ConfigMem, EncodeDict, FeatureTable,
};
use weft_common::{FabricConfig, MultiplexerStyle, TileCoord};
use weft_diagnostics::DiagnosticSink;

/// A tile whose only ports are the names its switch matrix uses, declared
/// as NULL-ended jumps so they carry no wires. Names end in a bundle index.
fn matrix_tile(name: &str, bels: Vec<Bel>, fan_in: FanInMap) -> Tile {
    let mut dests = BTreeMap::new();
    let mut sources = BTreeMap::new();
    for (destination, drivers) in fan_in.iter() {
        widen(&mut dests, destination);
        for source in drivers.iter().filter(|s| !s.is_constant()) {
            widen(&mut sources, source.name());
        }
    }
    let ports = dests
        .into_iter()
        .map(|(base, w)| Port::jump(base, NULL_PORT, w))
        .chain(sources.into_iter().map(|(base, w)| Port::jump(NULL_PORT, base, w)))
        .collect();
    Tile::new(name, ports, bels, fan_in).unwrap()
}

fn widen(widths: &mut BTreeMap<String, u32>, name: &str) {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let index: u32 = name[base.len()..].parse().unwrap();
    let width = widths.entry(base.to_string()).or_insert(0);
    *width = (*width).max(index + 1);
}

fn single_tile_fabric(tile: Tile, config: FabricConfig) -> Fabric {
    let grid = vec![vec![tile.name.clone()]];
    Fabric::new("test", config, grid, [tile], vec![]).unwrap()
}

#[test]
fn two_bit_bel_and_two_muxes() {
    let tile = matrix_tile(
        "T",
        vec![Bel::new("A", "", 2)],
        FanInMap::from_pairs([("M1", vec!["p0", "p1", "p2"]), ("M2", vec!["q0"])]),
    );
    let config = FabricConfig::default();
    let sink = DiagnosticSink::new();
    let compiled = compile_tile(&tile, &config, None, &sink).unwrap();
    assert_eq!(compiled.allocation.global_config_bits, 4);

    let m1 = compiled.allocation.mux("M1").unwrap();
    assert_eq!(m1.range.start, 2);
    assert_eq!(m1.range.width, 2);
    assert_eq!(m1.resolve(0b01).as_deref(), Some("p1"));

    let entry: Vec<_> = compiled.features.get("M1.p1").unwrap().iter().collect();
    let enc = &compiled.encode;
    assert_eq!(
        entry,
        vec![
            (enc.physical(3).unwrap(), BitValue::Zero),
            (enc.physical(2).unwrap(), BitValue::One)
        ]
    );
    assert!(compiled.features.get("M2.q0").unwrap().is_empty());

    let fabric = single_tile_fabric(tile, config);
    let graph = RoutingGraph::build(&fabric, &sink);
    let origin = TileCoord::new(0, 0);
    let m1_node = graph.find_node(origin, "M1").unwrap();
    let from = graph.mux_source(m1_node, 1).unwrap();
    assert_eq!(graph.node(from).name, "p1");
}

#[test]
fn six_bits_over_two_four_bit_frames() {
    let tile = Tile::new("T", vec![], vec![Bel::new("A", "", 6)], FanInMap::new()).unwrap();
    let config = FabricConfig::new(4, 2);
    let compiled = compile_tile(&tile, &config, None, &DiagnosticSink::new()).unwrap();
    let mem = compiled.config_mem.as_ref().unwrap();
    let masks: Vec<&str> = mem.entries.iter().map(|e| e.mask.as_str()).collect();
    assert_eq!(masks, vec!["1111", "1100"]);
    assert_eq!(mem.total_bits(), 6);

    let physical: BTreeSet<u32> = (0..6).map(|l| compiled.encode.physical(l).unwrap()).collect();
    assert_eq!(physical.len(), 6);
    assert!(physical.iter().all(|&p| p < 8));
}

fn wide_tile() -> Tile {
    let names: Vec<String> = (0..17).map(|k| format!("in{k}")).collect();
    let dests: Vec<String> = (2..=17).map(|n| format!("D{n}")).collect();
    let pairs = dests.iter().zip(2..=17usize).map(|(d, n)| {
        let sources: Vec<&str> = names[..n].iter().map(String::as_str).collect();
        (d.as_str(), sources)
    });
    matrix_tile(
        "WIDE",
        vec![Bel::new("L", "L_", 3).with_feature("INIT", vec![0, 2]).unwrap()],
        FanInMap::from_pairs(pairs),
    )
}

#[test]
fn every_select_value_agrees_across_views() {
    for style in [MultiplexerStyle::Generic, MultiplexerStyle::Discrete] {
        let config = FabricConfig::default().with_multiplexer_style(style);
        let sink = DiagnosticSink::new();
        let compiled = compile_tile(&wide_tile(), &config, None, &sink).unwrap();
        let fabric = single_tile_fabric(wide_tile(), config);
        let graph = RoutingGraph::build(&fabric, &sink);
        let origin = TileCoord::new(0, 0);

        for mux in compiled.allocation.muxes() {
            let node = graph.find_node(origin, &mux.destination).unwrap();
            for (k, source) in mux.sources.iter().enumerate() {
                let k = k as u32;
                assert_eq!(mux.resolve(k).as_deref(), Some(source.name()), "{style:?} {}", mux.destination);

                let via_graph = graph.mux_source(node, k).unwrap();
                assert_eq!(graph.node(via_graph).name, source.name());

                let mut image = ConfigImage::new(config.frame_bits_per_row, config.max_frames_per_col);
                let name = format!("{}.{}", mux.destination, source.name());
                image.enable(&compiled.features, &name, "X0Y0").unwrap();
                assert_eq!(image.read_select(mux, &compiled.encode), Some(k));
            }
        }
    }
}

#[test]
fn bits_are_conserved() {
    let tile = wide_tile();
    let config = FabricConfig::default();
    let compiled = compile_tile(&tile, &config, None, &DiagnosticSink::new()).unwrap();
    let mem = compiled.config_mem.as_ref().unwrap();
    let declared: u32 = mem.entries.iter().map(|e| e.bits_used).sum();
    let expected = tile.bel_config_bits()
        + tile
            .fan_in
            .iter()
            .map(|(_, sources)| weft_arch::select_width(sources.len()))
            .sum::<u32>();
    assert_eq!(declared, compiled.allocation.global_config_bits);
    assert_eq!(expected, compiled.allocation.global_config_bits);
}

#[test]
fn explicit_layout_is_injective() {
    let tile = Tile::new("T", vec![], vec![Bel::new("A", "", 6)], FanInMap::new()).unwrap();
    let config = FabricConfig::new(4, 2);
    let mem = ConfigMem::parse_csv(
        "frame_name,frame_index,bits_used_in_frame,used_bits_mask,ConfigBits_ranges\n\
         frame0,0,3,10_11,0:2\n\
         frame1,1,3,0111,5;3;4\n",
        "T",
    )
    .unwrap();
    let alloc = allocate(&tile, &config, &DiagnosticSink::new());
    let enc = EncodeDict::build(&mem, alloc.global_config_bits, &config).unwrap();
    let physical: Vec<u32> = enc.assigned().map(|(_, p)| p).collect();
    assert_eq!(physical, vec![3, 1, 0, 5, 4, 6]);
    FeatureTable::build(&tile, &alloc, &enc).unwrap();
}

#[test]
fn degenerate_multiplexers_take_no_bits() {
    let tile = matrix_tile(
        "T",
        vec![],
        FanInMap::from_pairs([("U0", vec![]), ("P0", vec!["x0"]), ("G0", vec!["GND0"])]),
    );
    let sink = DiagnosticSink::new();
    let compiled = compile_tile(&tile, &FabricConfig::default(), None, &sink).unwrap();
    assert_eq!(compiled.allocation.global_config_bits, 0);
    for name in ["U0", "P0.x0", "G0.GND0"] {
        assert!(compiled.features.get(name).unwrap().is_empty(), "{name}");
    }
    assert_eq!(sink.warning_count(), 1);
}

fn grid_fabric() -> Fabric {
    let lut = matrix_tile(
        "LUT",
        vec![Bel::new("LUT", "LA_", 2)
            .with_feature("FF", vec![1])
            .and_then(|b| b.with_feature("INIT", vec![0]))
            .unwrap()],
        FanInMap::from_pairs([("M0", vec!["a0", "a1", "a2"])]),
    );
    let io = Tile::new("IO", vec![], vec![Bel::new("IO", "", 1).with_feature("EN", vec![0]).unwrap()], FanInMap::new())
        .unwrap();
    let grid = vec![
        vec!["IO".to_string(), "LUT".to_string(), "LUT".to_string()],
        vec!["NULL".to_string(), "LUT".to_string(), "IO".to_string()],
    ];
    Fabric::new("grid", FabricConfig::new(4, 2), grid, [lut, io], vec![]).unwrap()
}

#[test]
fn compilation_is_deterministic() {
    let fabric = grid_fabric();
    let first = compile_fabric(&fabric, &BTreeMap::new(), &DiagnosticSink::new()).unwrap();
    let second = compile_fabric(&fabric, &BTreeMap::new(), &DiagnosticSink::new()).unwrap();
    let a = BitstreamSpec::from_compiled(&first).to_json().unwrap();
    let b = BitstreamSpec::from_compiled(&second).to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn fasm_assembles_and_reads_back() {
    let compiled = compile_fabric(&grid_fabric(), &BTreeMap::new(), &DiagnosticSink::new()).unwrap();
    let text = "X2Y0.M0.a2\nX1Y0.LA_FF\nX0Y0.A.EN\nX1Y1.M0.a1 = 0\n";
    let features = parse_fasm(text).unwrap();
    let images = assemble(&features, &compiled).unwrap();
    assert_eq!(images.len(), 3);

    let lut = &compiled.tiles["LUT"];
    let select = images[&TileCoord::new(2, 0)].read_select(lut.allocation.mux("M0").unwrap(), &lut.encode);
    assert_eq!(select, Some(2));

    let listing = fasm::disassemble(&images, &compiled).render();
    assert_eq!(listing, "X0Y0.A.EN\nX1Y0.LA_FF\nX2Y0.M0.a2\n");
}

#[test]
fn fasm_rejects_features_on_empty_cells() {
    let compiled = compile_fabric(&grid_fabric(), &BTreeMap::new(), &DiagnosticSink::new()).unwrap();
    let features = parse_fasm("X0Y1.LA_FF\n").unwrap();
    let err = assemble(&features, &compiled).unwrap_err();
    assert_eq!(err.code().to_string(), "F201");
}
