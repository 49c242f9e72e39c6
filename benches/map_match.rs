use criterion::criterion_main;
use serde_json::json;
use tracesnap::{
    CandidateFeature, CandidateIndex, IndexOptions, Network, Trace, TraceMatcher, TraceSnapOptions,
};
use tracesnap_fixtures::{Grid, jitter};

struct MapMatchScenario {
    name: &'static str,

    rows: usize,
    cols: usize,
    /// The grid nodes the trace walks through.
    path: &'static [(usize, usize)],
    samples: usize,
}

const MATCH_CASES: [MapMatchScenario; 2] = [
    MapMatchScenario {
        name: "GRID_L_TURN",
        rows: 10,
        cols: 10,
        path: &[(0, 0), (0, 9), (9, 9)],
        samples: 40,
    },
    MapMatchScenario {
        name: "GRID_STAIRCASE",
        rows: 20,
        cols: 20,
        path: &[(0, 0), (0, 5), (5, 5), (5, 10), (10, 10), (10, 15), (15, 15)],
        samples: 20,
    },
];

fn features(grid: &Grid) -> Vec<CandidateFeature> {
    grid.segments()
        .into_iter()
        .map(|segment| {
            let properties = json!({ "connectors": segment.connectors });
            CandidateFeature::new(segment.id, segment.geometry)
                .with_properties(properties.as_object().cloned().unwrap_or_default())
        })
        .collect()
}

fn target_benchmark(c: &mut criterion::Criterion) {
    let mut group = c.benchmark_group("match");
    group.significance_level(0.1).sample_size(30);

    MATCH_CASES.into_iter().for_each(|sc| {
        let grid = Grid::equatorial(sc.rows, sc.cols);
        let index = CandidateIndex::build(features(&grid), IndexOptions::default())
            .expect("Index must be created");
        let network = Network::from_connectors(&index, "connectors");

        let line = jitter(&grid.walk(sc.path, sc.samples), 3.0);
        let trace = Trace::from_linestring(sc.name, line);
        let matcher = TraceMatcher::new(&index, &network, TraceSnapOptions::default());

        group.bench_function(format!("match: {}", sc.name), |b| {
            b.iter(|| {
                let result = matcher
                    .snap(&trace)
                    .expect("Match must complete successfully");

                assert_eq!(result.points_with_matches, trace.len());
            })
        });
    });

    group.finish();
}

criterion::criterion_group!(targeted_benches, target_benchmark);
criterion_main!(targeted_benches);
