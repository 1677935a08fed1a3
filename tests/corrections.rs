use text_lattice::{
    AnnotationItem, AnnotationItemManager, EdgeRef, EdgeSequence, Lattice, LatticeError, TagMask,
    VertexId,
};

/// Scans the outgoing edges of `vertex` for the first one with the given
/// symbol category and returns its target.
fn step(lattice: &Lattice<'_>, vertex: VertexId, mask: &TagMask, category: &str) -> VertexId {
    let edge = lattice
        .out_edges(vertex, mask)
        .find(|&edge| lattice.annotation_category(edge) == category)
        .unwrap_or_else(|| panic!("no {:?} edge out of {:?}", category, vertex));
    lattice.edge_target(edge)
}

fn symbol_lattice<'a>(items: &'a AnnotationItemManager, text: &str) -> Lattice<'a> {
    let mut lattice = Lattice::with_text(items, text);
    lattice
        .add_symbols(lattice.first_vertex(), lattice.last_vertex())
        .unwrap();
    lattice
}

#[test]
fn erase_bypasses_a_character() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_erase(lattice.vertex_at(1).unwrap(), lattice.vertex_at(2).unwrap())
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");
    let mut vertex = lattice.first_vertex();
    for category in ["'c", "'a", "'r"] {
        vertex = step(&lattice, vertex, &mask, category);
    }
    assert_eq!(vertex, lattice.last_vertex());

    // The default walk takes the bypass as well.
    let mut vertex = lattice.first_vertex();
    let path = lattice.follow_path(&mut vertex, &mask);
    assert_eq!(lattice.sequence_text(&path).unwrap(), "car");

    // Erasing from the very first vertex has no preceding symbol edge to
    // rewire.
    assert!(matches!(
        lattice.correction_erase(lattice.first_vertex(), lattice.last_vertex()),
        Err(LatticeError::WrongVertex { .. })
    ));
}

#[test]
fn erase_requires_real_ordered_endpoints() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");
    let loose = lattice.add_loose_vertex();

    assert!(matches!(
        lattice.correction_erase(loose, lattice.vertex_at(2).unwrap()),
        Err(LatticeError::WrongVertex { .. })
    ));
    assert!(matches!(
        lattice.correction_erase(lattice.vertex_at(1).unwrap(), loose),
        Err(LatticeError::WrongVertex { .. })
    ));
    assert!(matches!(
        lattice.correction_erase(lattice.vertex_at(2).unwrap(), lattice.vertex_at(1).unwrap()),
        Err(LatticeError::WrongVertex { .. })
    ));
}

#[test]
fn insert_wires_new_symbols_into_the_walk() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_insert(lattice.vertex_at(2).unwrap(), "z")
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");
    let mut vertex = lattice.first_vertex();
    for category in ["'c", "'e", "'z", "'a", "'r"] {
        vertex = step(&lattice, vertex, &mask, category);
    }
    assert_eq!(vertex, lattice.last_vertex());

    // The text itself is untouched; the inserted symbols hang off loose
    // vertices.
    assert_eq!(lattice.all_text(), "cear");
    assert_eq!(lattice.count_vertices(), 6);
}

#[test]
fn insert_multiple_characters_chains_them() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cr");

    lattice
        .correction_insert(lattice.vertex_at(1).unwrap(), "za")
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");
    let mut vertex = lattice.first_vertex();
    for category in ["'c", "'z", "'a", "'r"] {
        vertex = step(&lattice, vertex, &mask, category);
    }
    assert_eq!(vertex, lattice.last_vertex());
}

#[test]
fn insert_rejects_loose_vertices() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");
    let loose = lattice.add_loose_vertex();
    assert!(matches!(
        lattice.correction_insert(loose, "z"),
        Err(LatticeError::WrongVertex { .. })
    ));
}

#[test]
fn replace_substitutes_a_character() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_replace(
            lattice.vertex_at(1).unwrap(),
            lattice.vertex_at(2).unwrap(),
            "z",
        )
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");
    let mut vertex = lattice.first_vertex();
    for category in ["'c", "'z", "'a", "'r"] {
        vertex = step(&lattice, vertex, &mask, category);
    }
    assert_eq!(vertex, lattice.last_vertex());
}

#[test]
fn replace_spans_the_whole_text() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_replace(lattice.first_vertex(), lattice.last_vertex(), "czar")
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");

    // The replacement chain is the first edge out of the start vertex.
    let first = lattice
        .out_edges(lattice.first_vertex(), &mask)
        .next()
        .unwrap();
    assert!(first.is_explicit());
    assert_eq!(lattice.annotation_category(first), "'c");

    let mut vertex = lattice.edge_target(first);
    for category in ["'z", "'a", "'r"] {
        vertex = step(&lattice, vertex, &mask, category);
    }
    assert_eq!(vertex, lattice.last_vertex());
}

#[test]
fn replace_with_empty_text_erases() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_replace(lattice.vertex_at(1).unwrap(), lattice.vertex_at(2).unwrap(), "")
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");
    let mut vertex = lattice.first_vertex();
    let path = lattice.follow_path(&mut vertex, &mask);
    assert_eq!(lattice.sequence_text(&path).unwrap(), "car");
}

#[test]
fn replace_requires_real_ordered_endpoints() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");
    let loose = lattice.add_loose_vertex();

    assert!(matches!(
        lattice.correction_replace(loose, lattice.vertex_at(2).unwrap(), "z"),
        Err(LatticeError::WrongVertex { .. })
    ));
    assert!(matches!(
        lattice.correction_replace(
            lattice.vertex_at(2).unwrap(),
            lattice.vertex_at(1).unwrap(),
            "z"
        ),
        Err(LatticeError::WrongVertex { .. })
    ));
}

#[test]
fn corrections_mark_bypassed_symbols_hidden() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_erase(lattice.vertex_at(1).unwrap(), lattice.vertex_at(2).unwrap())
        .unwrap();
    assert!(lattice.is_edge_hidden(EdgeRef::Implicit(1)));
    assert!(!lattice.is_edge_hidden(EdgeRef::Implicit(0)));
    assert!(!lattice.is_edge_hidden(EdgeRef::Implicit(2)));
}

#[test]
fn replaced_symbol_stays_visible_beside_its_alternative() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    // The replaced character now has two symbol edges fanning out of the
    // same vertex, so the original stays visible.
    lattice
        .correction_replace(
            lattice.vertex_at(1).unwrap(),
            lattice.vertex_at(2).unwrap(),
            "z",
        )
        .unwrap();
    assert!(!lattice.is_edge_hidden(EdgeRef::Implicit(1)));

    // A covering token edge still hides untouched symbols.
    let tags = lattice.tag_manager().singleton("token");
    lattice
        .add_edge(
            lattice.vertex_at(2).unwrap(),
            lattice.last_vertex(),
            AnnotationItem::new("word"),
            tags,
            EdgeSequence::new(),
        )
        .unwrap();
    assert!(lattice.is_edge_hidden(EdgeRef::Implicit(2)));
    assert!(lattice.is_edge_hidden(EdgeRef::Implicit(3)));
}

#[test]
fn erase_retargets_incoming_queries() {
    let items = AnnotationItemManager::new();
    let mut lattice = symbol_lattice(&items, "cear");

    lattice
        .correction_erase(lattice.vertex_at(1).unwrap(), lattice.vertex_at(2).unwrap())
        .unwrap();

    let mask = lattice.tag_manager().mask_named("symbol");
    // v2 now has two incoming symbol edges: 'e by position and the
    // retargeted 'c.
    let incoming: Vec<String> = lattice
        .in_edges(lattice.vertex_at(2).unwrap(), &mask)
        .map(|edge| lattice.annotation_category(edge))
        .collect();
    assert_eq!(incoming, ["'e", "'c"]);
    // v1 no longer receives the 'c edge.
    assert!(lattice
        .in_edges(lattice.vertex_at(1).unwrap(), &mask)
        .next()
        .is_none());
}
