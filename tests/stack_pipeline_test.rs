//! End-to-end pipeline: aliases on disk, through the combinators, into a
//! persisted stack with a complete derivation history.

use async_trait::async_trait;
use histmill::engine::{Tool, ToolChain, ToolCtx};
use histmill::hist::Hist1d;
use histmill::pipeline::{
    mc_stack_n_data_sum, sort_wrappers, StackOptions, DEFAULT_SORT_KEYS,
};
use histmill::storage::{DirStorage, WrapperStorage};
use histmill::wrappers::{Alias, HistoWrapper, Wrapper};
use histmill::Result;

fn seed_input(storage: &DirStorage) {
    let mk = |name: &str, fills: &[(f64, f64)]| {
        let mut h = Hist1d::with_uniform_bins(4, 0.0, 4.0);
        for &(x, w) in fills {
            h.fill(x, w);
        }
        Wrapper::Histo(HistoWrapper::new(name, h))
    };
    storage.write(&mk("data_met", &[(0.5, 7.0), (1.5, 5.0)]), "data_met").unwrap();
    storage.write(&mk("tt_met", &[(0.5, 4.0), (2.5, 4.0)]), "tt_met").unwrap();
    storage.write(&mk("wjets_met", &[(1.5, 9.0)]), "wjets_met").unwrap();
}

fn aliases(input: &std::path::Path) -> Vec<Alias> {
    let file = input.to_string_lossy().to_string();
    let mut data = Alias::new("data_met", file.clone());
    data.is_data = true;
    data.lumi = 3.0;
    data.legend = "Data".into();
    let mut tt = Alias::new("tt_met", file.clone());
    tt.sample = "tt".into();
    tt.legend = "Top".into();
    tt.lumi = 2.0;
    let mut wjets = Alias::new("wjets_met", file);
    wjets.sample = "wjets".into();
    wjets.legend = "W+jets".into();
    wjets.lumi = 3.0;
    vec![data, tt, wjets]
}

/// Loads aliases, packages them into a stack and a data sum, persists both.
struct StackPacker {
    input: std::path::PathBuf,
}

#[async_trait]
impl Tool for StackPacker {
    fn name(&self) -> &str {
        "stack_packer"
    }

    async fn run(&mut self, ctx: &mut ToolCtx) -> Result<Vec<Wrapper>> {
        let input = DirStorage::new(&self.input)?;
        let loaded = aliases(&self.input)
            .iter()
            .map(|a| {
                let mut w = a.resolve(&input)?;
                // every histogram in this test shares one identity
                w.info.name = "met".into();
                Ok(w)
            })
            .collect::<Result<Vec<_>>>()?;

        let sorted = sort_wrappers(loaded, &DEFAULT_SORT_KEYS);
        let groups = sorted.group(|w| w.info.name.clone());
        let options = StackOptions {
            target_lumi: ctx.settings.target_lumi,
            colors: ctx.settings.colors.clone(),
        };

        let mut output = Vec::new();
        for packaged in mc_stack_n_data_sum(groups, |w| w.legend.clone(), options) {
            let packaged = packaged?;
            if let Some(mut stack) = packaged.stack {
                stack.histo.info.name = "met_stack".into();
                output.push(Wrapper::Stack(stack));
            }
            if let Some(mut data) = packaged.data {
                data.info.name = "met_data".into();
                output.push(Wrapper::Histo(data));
            }
        }
        Ok(output)
    }
}

#[tokio::test]
async fn test_pipeline_persists_stack_with_derivation_history() -> anyhow::Result<()> {
    histmill::logging::init_logging(0);
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("input");
    seed_input(&DirStorage::new(&input_dir)?);

    let results_dir = dir.path().join("results");
    let mut ctx = ToolCtx::new(&results_dir)?;
    ctx.settings
        .colors
        .insert("Top".into(), "#d62728".into());

    let mut chain = ToolChain::new("plots");
    chain.push(Box::new(StackPacker {
        input: input_dir.clone(),
    }));
    chain.run_as_root(&mut ctx).await?;

    let storage = DirStorage::new(results_dir.join("plots").join("stack_packer"))?;
    let back = storage.read_list("result")?;
    assert_eq!(back.len(), 2);

    // the stack: tt shape 8/2 = 4, wjets shape 9/3 = 3 per unit lumi,
    // both scaled to the data lumi of 3.0
    let stack = match &back[0] {
        Wrapper::Stack(s) => s,
        other => panic!("expected stack, got {other}"),
    };
    assert_eq!(stack.histo.lumi, 3.0);
    assert_eq!(stack.histo.hist.integral(None, false), (4.0 + 3.0) * 3.0);
    assert_eq!(stack.constituents.len(), 2);
    let top = stack
        .constituents
        .iter()
        .find(|c| c.legend == "Top")
        .expect("Top constituent");
    assert_eq!(top.info.extra["color"], "#d62728");

    // the data sum keeps its lumi and contents
    let data = match &back[1] {
        Wrapper::Histo(h) => h,
        other => panic!("expected histogram, got {other}"),
    };
    assert_eq!(data.lumi, 3.0);
    assert_eq!(data.hist.integral(None, false), 12.0);

    // the persisted history is the rendered call tree of the whole pipeline
    let rendered = &stack.histo.info.extra["history"];
    for op in ["stack(", "prod(", "merge(", "load("] {
        assert!(rendered.contains(op), "history misses {op}: {rendered}");
    }

    // a second invocation reuses the persisted output
    let mut ctx = ToolCtx::new(&results_dir)?;
    let mut chain = ToolChain::new("plots");
    chain.push(Box::new(StackPacker { input: input_dir }));
    chain.run_as_root(&mut ctx).await?;
    assert_eq!(ctx.tools_run, 1); // only the chain re-ran
    Ok(())
}
