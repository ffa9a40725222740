use futures::executor::block_on;
use lanewise::classify::{LANE_TYPE, POOL_TYPE};
use lanewise::{
    CrossContainerFlows, Direction, Element, Error, Flow, Graph, LayoutOptions, Point, Rect,
};
use serde_json::json;

fn layout(graph: &Graph, options: &LayoutOptions) -> Graph {
    block_on(lanewise::apply_layout(graph, options)).expect("layout")
}

fn rect(g: &Graph, id: &str) -> Rect {
    g.element(id)
        .and_then(Element::rect)
        .unwrap_or_else(|| panic!("{id} has no geometry"))
}

fn waypoints<'g>(g: &'g Graph, id: &str) -> Option<&'g [Point]> {
    g.flow(id).and_then(|f| f.waypoints.as_deref())
}

fn close(a: Option<&Point>, b: Point) -> bool {
    a.is_some_and(|a| (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6)
}

fn two_lane_pool() -> Graph {
    Graph::new(
        vec![
            Element::new("Pool", POOL_TYPE).with_field("name", "Company"),
            Element::new("Lane1", LANE_TYPE).with_parent("Pool"),
            Element::new("Lane2", LANE_TYPE).with_parent("Pool"),
            Element::new("Task1", "bpmn:UserTask").with_parent("Lane1"),
            Element::new("Task2", "bpmn:ServiceTask").with_parent("Lane2"),
        ],
        vec![Flow::new("F1", "Task1", "Task2")],
    )
}

fn chain(ids: &[&str]) -> Graph {
    let elements = ids.iter().map(|id| Element::new(*id, "bpmn:Task")).collect();
    let flows = ids
        .windows(2)
        .enumerate()
        .map(|(i, w)| Flow::new(format!("F{i}"), w[0], w[1]))
        .collect();
    Graph::new(elements, flows)
}

#[test]
fn single_pool_with_two_lanes() {
    let out = layout(&two_lane_pool(), &LayoutOptions::default());

    let pool = rect(&out, "Pool");
    let lane1 = rect(&out, "Lane1");
    let lane2 = rect(&out, "Lane2");
    assert!(lane1.contains(&rect(&out, "Task1")));
    assert!(lane2.contains(&rect(&out, "Task2")));
    assert!(pool.contains(&lane1) && pool.contains(&lane2));
    assert!(lane2.y >= lane1.bottom() - 1e-6);
    assert_eq!(pool.height, lane1.height + lane2.height);

    // The flow crosses lanes, so no single region routed it.
    assert_eq!(waypoints(&out, "F1"), None);
}

#[test]
fn cross_lane_flows_can_be_routed_after_composition() {
    let options = LayoutOptions::default().with_cross_container_flows(CrossContainerFlows::Orthogonal);
    let out = layout(&two_lane_pool(), &options);

    let task1 = rect(&out, "Task1");
    let task2 = rect(&out, "Task2");
    let pts = waypoints(&out, "F1").expect("routed");
    assert!(pts.len() >= 2);
    assert_eq!(pts.first(), Some(&Point::new(task1.right(), task1.center().y)));
    assert_eq!(pts.last(), Some(&Point::new(task2.x, task2.center().y)));
    for w in pts.windows(2) {
        assert!(w[0].x == w[1].x || w[0].y == w[1].y, "diagonal segment {w:?}");
    }
}

#[test]
fn free_chain_flows_left_to_right() {
    let out = layout(&chain(&["A", "B", "C", "D", "E"]), &LayoutOptions::default());
    let rects: Vec<Rect> = ["A", "B", "C", "D", "E"].iter().map(|id| rect(&out, id)).collect();

    for w in rects.windows(2) {
        assert!(w[0].x < w[1].x);
        assert!(w[0].right() <= w[1].x + 1e-6, "{w:?} overlap");
    }
    let top = rects.iter().map(|r| r.y).fold(f64::NEG_INFINITY, f64::max);
    let bottom = rects.iter().map(Rect::bottom).fold(f64::INFINITY, f64::min);
    assert!(top < bottom, "chain spread over several bands");

    for i in 0..4 {
        let pts = waypoints(&out, &format!("F{i}")).expect("chain flow routed");
        assert!(pts.len() >= 2);
    }
}

#[test]
fn direction_down_stacks_the_chain_vertically() {
    let options = LayoutOptions::default().with_direction(Direction::Down);
    let out = layout(&chain(&["A", "B", "C"]), &options);
    let (a, b, c) = (rect(&out, "A"), rect(&out, "B"), rect(&out, "C"));
    assert!(a.y < b.y && b.y < c.y);
    assert!(a.bottom() <= b.y + 1e-6);

    let pts = waypoints(&out, "F0").expect("routed");
    assert!(close(pts.first(), Point::new(a.center().x, a.bottom())));
    assert!(close(pts.last(), Point::new(b.center().x, b.y)));
}

#[test]
fn empty_graph_lays_out_to_itself() {
    let g = Graph::from_json_str(r#"{"elements": [], "flows": []}"#).expect("graph");
    let out = layout(&g, &LayoutOptions::default());
    assert_eq!(
        serde_json::to_value(&out).expect("json"),
        json!({"elements": [], "flows": []})
    );
}

#[test]
fn dangling_flow_gets_no_waypoints() {
    let mut g = chain(&["A", "B"]);
    g.flows.push(Flow::new("Dangling", "A", "Nowhere"));
    let out = layout(&g, &LayoutOptions::default());

    assert_eq!(waypoints(&out, "Dangling"), None);
    assert!(waypoints(&out, "F0").is_some());
    assert!(out.element("A").and_then(Element::rect).is_some());
}

#[test]
fn non_geometric_fields_survive() {
    let raw = json!({
        "elements": [
            {"id": "P", "type": "bpmn:Participant", "name": "Org", "color": "#ffcc00"},
            {"id": "T", "type": "bpmn:Task", "parentId": "P", "name": "Do it",
             "meta": {"sourceArtifactId": "doc_1", "pageNumber": 2}}
        ],
        "flows": [
            {"id": "F", "source": "T", "target": "T", "type": "sequenceFlow", "name": "again",
             "waypoints": [{"x": -1, "y": -1}]}
        ],
        "diagramVersion": 7
    });
    let g: Graph = serde_json::from_value(raw).expect("graph");
    let out = serde_json::to_value(layout(&g, &LayoutOptions::default())).expect("json");

    assert_eq!(out["diagramVersion"], json!(7));
    assert_eq!(out["elements"][0]["color"], json!("#ffcc00"));
    assert_eq!(out["elements"][1]["parentId"], json!("P"));
    assert_eq!(out["elements"][1]["meta"]["pageNumber"], json!(2));
    assert_eq!(out["flows"][0]["name"], json!("again"));
    assert_eq!(out["flows"][0]["type"], json!("sequenceFlow"));
    // The stale waypoint was replaced by the self-loop route.
    assert_ne!(out["flows"][0]["waypoints"][0], json!({"x": -1.0, "y": -1.0}));
}

#[test]
fn stale_waypoints_are_cleared_when_a_flow_is_not_routed() {
    let mut g = two_lane_pool();
    g.flows[0].waypoints = Some(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
    let out = layout(&g, &LayoutOptions::default());
    assert_eq!(waypoints(&out, "F1"), None);
    assert!(g.flows[0].waypoints.is_some(), "input must stay untouched");
}

#[test]
fn size_floors_apply_to_sparse_containers() {
    let g = Graph::new(
        vec![
            Element::new("P1", POOL_TYPE),
            Element::new("L", LANE_TYPE).with_parent("P1"),
            Element::new("S", "bpmn:StartEvent").with_parent("L"),
            Element::new("P2", POOL_TYPE),
        ],
        Vec::new(),
    );
    let out = layout(&g, &LayoutOptions::default());

    let lane = rect(&out, "L");
    assert!(lane.width >= 600.0 && lane.height >= 150.0);
    let p2 = rect(&out, "P2");
    assert!(p2.width >= 600.0 && p2.height >= 200.0);
}

#[test]
fn pools_and_lanes_stack_in_input_order() {
    let g = Graph::new(
        vec![
            Element::new("P1", POOL_TYPE),
            Element::new("L1", LANE_TYPE).with_parent("P1"),
            Element::new("L2", LANE_TYPE).with_parent("P1"),
            Element::new("L3", LANE_TYPE).with_parent("P1"),
            Element::new("P2", POOL_TYPE),
            Element::new("T", "bpmn:Task").with_parent("P2"),
            Element::new("Free", "bpmn:Task"),
        ],
        Vec::new(),
    );
    let spacing = 40.0;
    let out = layout(&g, &LayoutOptions::default().with_spacing(spacing));

    let (l1, l2, l3) = (rect(&out, "L1"), rect(&out, "L2"), rect(&out, "L3"));
    assert!(l1.y < l2.y && l2.y < l3.y);
    assert!(l2.y >= l1.bottom() - 1e-6 && l3.y >= l2.bottom() - 1e-6);

    let (p1, p2) = (rect(&out, "P1"), rect(&out, "P2"));
    assert_eq!(p1.y, 0.0);
    assert_eq!(p2.y, p1.bottom() + spacing);
    assert!(p2.contains(&rect(&out, "T")));
    assert!(rect(&out, "Free").y >= p2.bottom() + spacing - 1e-6);
}

#[test]
fn every_child_lies_inside_its_parent() {
    let g = Graph::new(
        vec![
            Element::new("P", POOL_TYPE),
            Element::new("L1", LANE_TYPE).with_parent("P"),
            Element::new("L2", LANE_TYPE).with_parent("P"),
            Element::new("S", "bpmn:StartEvent").with_parent("L1"),
            Element::new("T1", "bpmn:Task").with_parent("L1"),
            Element::new("G", "bpmn:ExclusiveGateway").with_parent("L1"),
            Element::new("T2", "bpmn:Task").with_parent("L1"),
            Element::new("T3", "bpmn:Task").with_parent("L1"),
            Element::new("D", "bpmn:DataObjectReference").with_parent("L2"),
            Element::new("E", "bpmn:EndEvent").with_parent("L2"),
            Element::new("Unlaned", "bpmn:Task").with_parent("P"),
        ],
        vec![
            Flow::new("f1", "S", "T1"),
            Flow::new("f2", "T1", "G"),
            Flow::new("f3", "G", "T2"),
            Flow::new("f4", "G", "T3"),
            Flow::new("f5", "T3", "T1"),
        ],
    );
    for direction in [Direction::Right, Direction::Down] {
        let out = layout(&g, &LayoutOptions::default().with_direction(direction));
        for e in &out.elements {
            let Some(parent) = e.parent_id.as_deref() else {
                continue;
            };
            let own = e.rect().expect("geometry");
            assert!(rect(&out, parent).contains(&own), "{} escapes {parent}", e.id);
        }
        for id in ["f1", "f2", "f3", "f4", "f5"] {
            assert!(waypoints(&out, id).is_some(), "{id} not routed");
        }
    }
}

#[test]
fn invalid_options_are_rejected_before_layout() {
    let err = lanewise::apply_layout_sync(&chain(&["A"]), &LayoutOptions::new().with_spacing(-5.0))
        .expect_err("negative spacing");
    assert!(matches!(err, Error::InvalidOptions { .. }));
}

#[test]
fn async_and_sync_entry_points_agree() {
    let g = two_lane_pool();
    let options = LayoutOptions::default();
    let sync = lanewise::apply_layout_sync(&g, &options).expect("sync");
    assert_eq!(layout(&g, &options), sync);
}
