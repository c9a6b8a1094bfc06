use ranktree::{
    Discretization, NO_NODE, Tree, TreeInt, parse_newick, parse_newick_arena,
    write_newick,
};

fn ranked(newick: &str) -> Tree {
    parse_newick(newick, Discretization::Ranked)
        .unwrap_or_else(|err| panic!("Failed to rank {newick}: {err}"))
}

fn times(tree: &Tree) -> Vec<TreeInt> {
    tree.nodes().iter().map(|node| node.time()).collect()
}

/// Clusters of the ranked tree, as sorted label lists.
fn tree_clusters(tree: &Tree) -> Vec<Vec<String>> {
    let mut clusters: Vec<Vec<String>> = tree
        .clusters()
        .iter()
        .map(|cluster| {
            cluster
                .iter()
                .map(|&leaf| tree.leaf_label(leaf).unwrap().to_string())
                .collect()
        })
        .collect();
    clusters.sort();
    clusters
}

/// Clusters implied by the NEWICK topology alone.
fn newick_clusters(newick: &str) -> Vec<Vec<String>> {
    let parsed = parse_newick_arena(newick).unwrap();
    let mut clusters: Vec<Vec<String>> = parsed
        .internal_ids()
        .iter()
        .map(|&id| {
            parsed.cluster(id).into_iter().map(str::to_string).collect()
        })
        .collect();
    clusters.sort();
    clusters
}

/// (..((L00:1,L01:1):1,L02:2):1,..,Lnn:n); internal node k sits at height k.
fn caterpillar(leaf_count: usize) -> String {
    let mut newick = "(L00:1,L01:1)".to_string();
    for k in 2..leaf_count {
        newick = format!("({newick}:1,L{k:02}:{k})");
    }
    newick.push(';');
    newick
}

/// Perfectly balanced tree whose sibling lengths differ by rounding noise.
fn balanced(depth: usize, next_leaf: &mut usize) -> String {
    if depth == 0 {
        let label = format!("T{:03}", *next_leaf);
        *next_leaf += 1;
        return label;
    }
    let left = balanced(depth - 1, next_leaf);
    let right = balanced(depth - 1, next_leaf);
    format!("({left}:1.0000000001,{right}:0.9999999999)")
}

fn assert_layout_invariants(tree: &Tree, leaf_count: usize) {
    assert!(tree.validate().is_ok(), "validate: {:?}", tree.validate());
    assert_eq!(tree.num_leaves(), leaf_count);
    assert_eq!(tree.node_count(), 2 * leaf_count - 1);

    for node in &tree.nodes()[..leaf_count] {
        assert_eq!(node.time(), 0, "Leaf {} has a time", node.index());
        assert_eq!(node.children(), [NO_NODE, NO_NODE]);
    }
    let internal_times: Vec<TreeInt> =
        tree.internal_nodes().map(|(_, node)| node.time()).collect();
    assert!(
        internal_times.windows(2).all(|pair| pair[0] < pair[1]),
        "Internal times must increase: {internal_times:?}"
    );
    let roots = tree.nodes().iter().filter(|node| node.is_root()).count();
    assert_eq!(roots, 1, "Exactly one node has no parent");
    assert_eq!(tree.root().unwrap().index(), 2 * leaf_count - 2);
    assert_eq!(tree.root_time(), tree.root().unwrap().time());
}

#[test]
fn test_two_leaf_tree() {
    let tree = ranked("(A:1.0,B:1.0):0.0;");

    assert_eq!(tree.node_count(), 3);
    assert_eq!(tree.leaf_labels().len(), 2);
    assert_eq!(tree.leaf_index("A"), Some(0));
    assert_eq!(tree.leaf_index("B"), Some(1));
    assert_eq!(tree[2].time(), 1);
    assert_eq!(tree[2].parent(), NO_NODE);
    assert_eq!(tree[2].children(), [0, 1]);
    assert_eq!(tree[0].parent(), 2);
    assert_eq!(tree[1].parent(), 2);
    assert_eq!(tree.root_time(), 1);
}

#[test]
fn test_three_leaf_tree() {
    let tree = ranked("((A:1.0,B:1.0):1.0,C:2.0):0.0;");

    assert_eq!(tree.node_count(), 5);
    assert_eq!(times(&tree), vec![0, 0, 0, 1, 2]);
    assert_eq!(tree[3].children(), [0, 1], "Inner node holds A and B");
    assert_eq!(tree[4].children(), [3, 2], "Children keep input order");
    assert_eq!(tree[2].parent(), 4);
    assert_eq!(tree[3].parent(), 4);
    assert_eq!(tree[4].parent(), NO_NODE);
    assert_eq!(tree.root_time(), 2);
    assert_layout_invariants(&tree, 3);
}

#[test]
fn test_leaves_are_sorted_by_label() {
    let tree = ranked("((Zeta:1,Alpha:1):2,(Mu:1.5,Beta:1.5):1.5);");

    assert_eq!(
        tree.leaf_labels().iter().map(|l| l.as_ref()).collect::<Vec<_>>(),
        vec!["Alpha", "Beta", "Mu", "Zeta"]
    );
    assert_eq!(tree[4].children(), [3, 0], "Zeta,Alpha cherry ranks first");
    assert_eq!(tree[5].children(), [2, 1], "Mu,Beta cherry ranks second");
    assert_eq!(tree[6].children(), [4, 5]);
}

#[test]
fn test_equal_heights_follow_input_order() {
    let tree = ranked("((A:1,B:1):1,(C:1,D:1):1);");
    assert_eq!(tree[4].children(), [0, 1]);
    assert_eq!(tree[5].children(), [2, 3]);
    assert_eq!(tree[6].children(), [4, 5]);

    let tree = ranked("((C:1,D:1):1,(A:1,B:1):1);");
    assert_eq!(tree[4].children(), [2, 3]);
    assert_eq!(tree[5].children(), [0, 1]);
    assert_eq!(tree[6].children(), [4, 5]);
}

#[test]
fn test_zero_length_edge_keeps_child_below_parent() {
    let tree = ranked("((A:1,B:1):0,C:1);");
    assert_eq!(times(&tree), vec![0, 0, 0, 1, 2]);
    assert_eq!(tree[4].children(), [3, 2]);
    assert_layout_invariants(&tree, 3);
}

#[test]
fn test_missing_lengths_give_a_valid_ranking() {
    let tree = ranked("((A,B),(C,(D,E)));");
    assert_layout_invariants(&tree, 5);
    assert_eq!(tree_clusters(&tree), newick_clusters("((A,B),(C,(D,E)));"));
}

#[test]
fn test_rank_mode_on_generated_trees() {
    let mut next_leaf = 0;
    let balanced_newick = format!("{};", balanced(5, &mut next_leaf));
    let test_cases = vec![
        ("Caterpillar", caterpillar(40), 40),
        ("Balanced", balanced_newick, 32),
    ];

    for (name, newick, leaf_count) in test_cases {
        println!("Testing: {}", name);
        let tree = ranked(&newick);
        assert_layout_invariants(&tree, leaf_count);

        let internal_times: Vec<TreeInt> =
            tree.internal_nodes().map(|(_, node)| node.time()).collect();
        let expected: Vec<TreeInt> = (1..leaf_count as TreeInt).collect();
        assert_eq!(internal_times, expected, "{name}: ranks are 1..L-1");
        assert_eq!(tree_clusters(&tree), newick_clusters(&newick), "{name}");
    }
}

#[test]
fn test_caterpillar_ranks_follow_heights() {
    let tree = ranked(&caterpillar(12));
    for (index, node) in tree.internal_nodes() {
        let cluster_size = tree.clusters()[index - 12].len();
        assert_eq!(
            node.time() as usize + 1,
            cluster_size,
            "Node {index} of the caterpillar"
        );
    }
}

#[test]
fn test_timed_mode_scales_heights() {
    let newick = "((A:1.0,B:1.0):1.0,C:2.0):0.0;";

    let tree = parse_newick(newick, Discretization::Timed(1.0)).unwrap();
    assert_eq!(times(&tree), vec![0, 0, 0, 1, 2]);

    let tree = parse_newick(newick, Discretization::Timed(2.5)).unwrap();
    assert_eq!(times(&tree), vec![0, 0, 0, 3, 5]);
    assert_eq!(tree.root_time(), 5);
    assert_layout_invariants(&tree, 3);

    let tree = parse_newick(newick, Discretization::TimedAuto).unwrap();
    assert_eq!(times(&tree), vec![0, 0, 0, 1, 2]);
}

#[test]
fn test_timed_mode_on_generated_tree() {
    let newick = caterpillar(25);
    let tree = parse_newick(&newick, Discretization::Timed(3.0)).unwrap();
    assert_layout_invariants(&tree, 25);
    assert_eq!(tree.root_time(), 72);
    assert_eq!(tree_clusters(&tree), newick_clusters(&newick));
}

#[test]
fn test_written_newick_reads_back_to_the_same_tree() {
    let tree = ranked("((A:1.0,B:1.0):1.0,C:2.0):0.0;");
    let newick = write_newick(&tree);
    assert_eq!(newick, "((A:1,B:1):1,C:2);");
    assert_eq!(ranked(&newick), tree);

    let tree = ranked("(('Homo sapiens':1,B:1):2,(C:0.5,D:0.5):2.5);");
    let newick = write_newick(&tree);
    assert_eq!(newick, "(('Homo sapiens':2,B:2):1,(C:1,D:1):2);");
    assert_eq!(ranked(&newick), tree);
}
