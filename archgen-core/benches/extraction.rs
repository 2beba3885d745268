//! Benchmarks for extraction and diagram synthesis.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use archgen_core::diagram::{class_diagram, component_diagram, routes_diagram};
use archgen_core::extract::extract_source;
use archgen_core::types::{
    Category, ComponentEntry, ComponentStructure, ExtractOptions, ProjectConfig, ProjectDefaults,
    RouteEntry,
};

const SOURCE: &str = r#"
import { ThemeStorage } from './ThemeStorage';
import type { IFaviconManager } from './interfaces/IFaviconManager';

export interface ThemeOptions {
    readonly storageKey: string;
    animate?: boolean;
    apply(theme: Theme): void;
}

export class ThemeManager extends BaseManager<Theme> implements Disposable {
    private storage: ThemeStorage;
    public readonly name = 'theme';
    protected static instances: number;

    constructor(storage: ThemeStorage, private favicon: IFaviconManager) {
        super();
        this.storage = storage;
    }

    public async init(root: HTMLElement, force = false): Promise<void> {
        const theme = this.storage.load() ?? 'dark';
        await this.apply(theme, force);
    }

    protected apply(theme: Theme, ...extra: string[]) {
        document.documentElement.dataset.theme = theme;
    }

    static create(options) {
        return new ThemeManager(options.storage, options.favicon);
    }
}
"#;

fn bench_extract_source(c: &mut Criterion) {
    let options = ExtractOptions::default();
    c.bench_function("extract_typescript_file", |b| {
        b.iter(|| extract_source(black_box(SOURCE), "src/services/ThemeManager.ts", &options))
    });
}

fn bench_diagrams(c: &mut Criterion) {
    let extraction = extract_source(SOURCE, "src/services/ThemeManager.ts", &ExtractOptions::default());
    let files = vec![extraction; 50];

    let mut structure = ComponentStructure::default();
    for category in Category::ALL {
        let entries = (0..20)
            .map(|i| ComponentEntry {
                name: format!("Item{}", i),
                path: format!("{}/Item{}.tsx", category, i),
                kind: "react".to_string(),
            })
            .collect();
        structure.set(category, entries);
    }
    let config = ProjectConfig::with_defaults(&ProjectDefaults::default());

    let routes: Vec<RouteEntry> = (0..200)
        .map(|i| RouteEntry {
            file: format!("src/pages/blog/post-{}.md", i),
            path: format!("/blog/post-{}", i),
        })
        .collect();

    c.bench_function("class_diagram_50_files", |b| {
        b.iter(|| class_diagram(black_box(&files)))
    });
    c.bench_function("component_diagram", |b| {
        b.iter(|| component_diagram(black_box(&structure), &config))
    });
    c.bench_function("routes_diagram_200_routes", |b| {
        b.iter(|| routes_diagram(black_box(&routes)))
    });
}

criterion_group!(benches, bench_extract_source, bench_diagrams);
criterion_main!(benches);
