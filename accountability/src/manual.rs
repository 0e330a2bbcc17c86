/*!

This is the long-form manual for `accountability` and `tierwatch`.

## Inputs

Three datasets are merged, keyed as follows:
* the roster (required): one line per representative, keyed by full name, with
  the party affiliation, the constituency, the number of rental properties
  held and whether the representative holds executive office
* the recorded votes (optional, partial): by representative name, a list of
  `(event id, cast)` pairs on the tracked events
* the electoral data (optional, partial): by constituency, the margin of the
  last election in percentage points and the number of votes needed to flip
  the seat

A missing dataset is reported in the diagnostics and never stops the run.

## Synthesized votes

Property holders without any recorded vote receive a synthesized vote on every
tracked event. The likelihood of an unfavorable vote is the base likelihood of
the affiliation (or the default likelihood), plus `holdings x per holding
adjustment`, the latter capped at the maximum holding adjustment. A uniform draw
in `[0, 1)` below that likelihood is unfavorable, the next band (of fixed
width) is an abstention, anything above is favorable.

Synthesized votes are always flagged as such in the report. They are plausible
patterns, not facts, and must not be presented as recorded votes.

With a seed, each representative draws from a stream seeded by the SHA-256
digest of `"{seed}:{name}"`: the same seed always produces the same votes,
whatever the order of the roster.

## Scores

The inconsistency score (0 to 100) is the sum of:

| term          | value                                            |
|---------------|--------------------------------------------------|
| holdings      | `min(holdings x 3, 30)`                          |
| conflicts     | `15` per conflicting vote                        |
| executive     | `15` when holding executive office               |
| vulnerability | `10` when the margin is known and below `5`      |

clamped to 100. A vote conflicts when it goes against the favorable position
of the event, in both directions: voting against a favorable bill or for an
unfavorable one. Abstentions never conflict.

With the `eventWeight` conflict mode, each conflict is worth
`15 x event weight` instead, rounded once over the total. This changes the
scores compared to the default mode.

The priority score (1 to 10) starts at 1, adds 3, 2 or 1 for at least 10, 5 or
1 properties, adds the number of conflicts up to 3, and adds 3, 2 or 1 for a
margin below 1, 2.5 or 5 points.

## Tiers

| tier     | margin             |
|----------|--------------------|
| CRITICAL | below 1            |
| HIGH     | below 2.5          |
| MEDIUM   | below 5            |
| LOW      | 5 or more, unknown |

Within a tier, representatives are sorted by decreasing combined priority
`0.6 x inconsistency + 0.4 x priority x 10`, then by roster order.

## Configuration

`tierwatch` reads a JSON configuration file:

```json
{
  "outputSettings": {
    "reportName": "Tenant protection accountability",
    "outputPath": "report.json",
    "tierLimits": { "critical": 5, "high": 8, "medium": 10, "low": 10 }
  },
  "dataSources": {
    "roster": { "provider": "csv", "filePath": "roster.csv" },
    "votes": { "provider": "json", "filePath": "votes.json" },
    "electoral": { "provider": "csv", "filePath": "margins.csv" }
  },
  "trackedEvents": [
    { "id": "rent-freeze", "title": "Rent freeze", "date": "2020-10-21",
      "favorablePosition": "for", "weight": 1.5 }
  ],
  "rules": {
    "affiliationLikelihoods": { "Blue": 0.7, "Green": 0.1 },
    "defaultLikelihood": 0.5,
    "randomSeed": "42",
    "conflictWeighting": "flat",
    "governingAffiliations": ["Blue"]
  }
}
```

Paths are relative to the configuration file. Every rule is optional and falls
back to [crate::ReportRules::DEFAULT_RULES].

*/
